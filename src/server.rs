//! HTTP adapter: translates widget requests into `Advisor` calls.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::orchestrator::Submission;
use crate::{
    Advisor, AdvisorError, ChatBackend, ChatOutcome, ChatRequest, Product, Turn, markdown, view,
};

pub struct AppState {
    advisor: Mutex<Advisor>,
    backend: Arc<dyn ChatBackend>,
}

impl AppState {
    pub fn new(advisor: Advisor, backend: Arc<dyn ChatBackend>) -> Arc<Self> {
        Arc::new(Self { advisor: Mutex::new(advisor), backend })
    }
}

pub struct ApiError(AdvisorError);

impl From<AdvisorError> for ApiError {
    fn from(e: AdvisorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AdvisorError::UnknownProduct(_) | AdvisorError::SelectionIndex(_) => StatusCode::NOT_FOUND,
            AdvisorError::EmptySelection => StatusCode::BAD_REQUEST,
            AdvisorError::RequestInFlight => StatusCode::CONFLICT,
            AdvisorError::Chat(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct ProductCard<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub selected: bool,
}

#[derive(Serialize)]
pub struct ProductsBody<'a> {
    pub products: Vec<ProductCard<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub html: String,
}

#[derive(Serialize)]
pub struct SelectionBody {
    pub products: Vec<Product>,
    pub html: String,
}

#[derive(Deserialize)]
pub struct ToggleBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct QuestionBody {
    pub question: String,
}

#[derive(Serialize, Default)]
pub struct ChatBody {
    pub turns: Vec<Turn>,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub copyable: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/categories", get(categories))
        .route("/api/products", get(products))
        .route("/api/selection", get(selection).delete(clear_selection))
        .route("/api/selection/toggle", post(toggle))
        .route("/api/selection/{index}", delete(remove_selected))
        .route("/api/routine", post(routine))
        .route("/api/chat", post(chat))
        .route("/api/transcript", get(transcript))
        .route("/api/render", post(render))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Adds static file serving for everything outside `/api`.
pub fn with_static(router: Router, dir: &std::path::Path) -> Router {
    router.fallback_service(ServeDir::new(dir))
}

pub async fn serve(router: Router, bind: &str) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Advisor listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn categories(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let advisor = state.advisor.lock().await;
    Json(advisor.categories().into_iter().map(String::from).collect())
}

async fn products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> Response {
    let mut advisor = state.advisor.lock().await;
    advisor.set_category(query.category.as_deref());
    advisor.set_search(&query.q);
    let visible = advisor.visible_products();
    let body = ProductsBody {
        products: visible
            .iter()
            .map(|p| ProductCard { product: p, selected: advisor.selection().contains(&p.name) })
            .collect(),
        placeholder: visible.is_empty().then_some(crate::filter::NO_MATCHES),
        html: view::render_product_grid(&visible, advisor.selection()),
    };
    Json(&body).into_response()
}

fn selection_body(advisor: &Advisor) -> SelectionBody {
    SelectionBody {
        products: advisor.selection().products().to_vec(),
        html: view::render_selected_panel(advisor.selection()),
    }
}

async fn selection(State(state): State<Arc<AppState>>) -> Json<SelectionBody> {
    Json(selection_body(&*state.advisor.lock().await))
}

async fn toggle(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ToggleBody>,
) -> ApiResult<SelectionBody> {
    let mut advisor = state.advisor.lock().await;
    advisor.toggle(&body.name)?;
    Ok(Json(selection_body(&advisor)))
}

async fn remove_selected(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<SelectionBody> {
    let mut advisor = state.advisor.lock().await;
    advisor.remove_selected(index)?;
    Ok(Json(selection_body(&advisor)))
}

async fn clear_selection(State(state): State<Arc<AppState>>) -> ApiResult<SelectionBody> {
    let mut advisor = state.advisor.lock().await;
    advisor.clear_selection()?;
    Ok(Json(selection_body(&advisor)))
}

fn chat_body(advisor: &Advisor, outcome: Option<ChatOutcome>) -> ChatBody {
    let mut body = ChatBody {
        turns: advisor.transcript().turns().to_vec(),
        html: view::render_transcript(advisor.transcript()),
        ..ChatBody::default()
    };
    match outcome {
        Some(ChatOutcome::Reply { text, copyable }) => {
            body.reply = Some(text);
            body.copyable = copyable;
        }
        Some(ChatOutcome::BackendError { message }) => body.error = Some(message),
        None => {}
    }
    body
}

// The advisor lock is released while the backend call is outstanding.
async fn routine(State(state): State<Arc<AppState>>) -> ApiResult<ChatBody> {
    let request = state.advisor.lock().await.begin_routine()?;
    finish_exchange(state, request).await
}

/// Sends and completes on a detached task, so a client that goes away
/// mid-call cannot leave the in-flight slot claimed.
async fn finish_exchange(state: Arc<AppState>, request: ChatRequest) -> ApiResult<ChatBody> {
    let exchange = tokio::spawn(async move {
        let result = state.backend.send(&request).await;
        let mut advisor = state.advisor.lock().await;
        let outcome = advisor.complete(result)?;
        Ok::<_, AdvisorError>(chat_body(&advisor, Some(outcome)))
    });
    let body = exchange.await.map_err(|e| AdvisorError::Task(e.to_string()))??;
    Ok(Json(body))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QuestionBody>,
) -> ApiResult<ChatBody> {
    let submission = state.advisor.lock().await.begin_question(&body.question)?;
    let request = match submission {
        Submission::Send(request) => request,
        Submission::Rejected(message) => {
            let advisor = state.advisor.lock().await;
            let mut body = chat_body(&advisor, None);
            body.html.push_str(&view::render_notice(message));
            body.notice = Some(message.to_string());
            return Ok(Json(body));
        }
        Submission::Ignored => return Ok(Json(chat_body(&*state.advisor.lock().await, None))),
    };
    finish_exchange(state, request).await
}

async fn transcript(State(state): State<Arc<AppState>>) -> Json<ChatBody> {
    Json(chat_body(&*state.advisor.lock().await, None))
}

async fn render(body: String) -> axum::response::Html<String> {
    axum::response::Html(markdown::render(&body))
}
