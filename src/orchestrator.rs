use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chat::{RequestKind, routine_prompt};
use crate::filter::{self, FilterState};
use crate::guard::OFF_TOPIC_REPLY;
use crate::{
    AdvisorError, Catalog, ChatBackend, ChatError, ChatOutcome, ChatReply, ChatRequest,
    ChatSession, Product, Result, SelectionSet, SelectionStore, TopicGuard, Transcript,
};

/// First half of a chat exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Send this to the backend, then hand the result to [`Advisor::complete`].
    Send(ChatRequest),
    /// Off-topic question; show the message, nothing was recorded.
    Rejected(&'static str),
    /// Blank input.
    Ignored,
}

/// Result of a follow-up question driven end to end.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Chat(ChatOutcome),
    Rejected(&'static str),
    Ignored,
}

/// All application state, mutated only through these methods.
pub struct Advisor {
    catalog: Catalog,
    filter: FilterState,
    selection: SelectionSet,
    session: ChatSession,
    guard: TopicGuard,
    in_flight: Option<RequestKind>,
}

impl Advisor {
    /// Restores the persisted selection from `store`.
    pub fn new(catalog: Catalog, store: Arc<dyn SelectionStore>) -> Self {
        Self {
            catalog,
            filter: FilterState::default(),
            selection: SelectionSet::restore(store),
            session: ChatSession::new(),
            guard: TopicGuard::new(),
            in_flight: None,
        }
    }

    pub fn categories(&self) -> Vec<&str> {
        filter::categories(self.catalog.products())
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.filter.set_category(category);
    }

    pub fn set_search(&mut self, keyword: &str) {
        self.filter.set_search(keyword);
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        filter::filtered_view(self.catalog.products(), &self.filter)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Toggles a product by name. Stale selections no longer in the catalog
    /// can still be toggled off.
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        let product = self
            .catalog
            .find(name)
            .or_else(|| self.selection.iter().find(|p| p.name == name))
            .cloned()
            .ok_or_else(|| AdvisorError::UnknownProduct(name.to_string()))?;
        self.selection.toggle(&product)
    }

    pub fn remove_selected(&mut self, index: usize) -> Result<Product> {
        self.selection.remove_at(index)
    }

    pub fn clear_selection(&mut self) -> Result<()> {
        self.selection.clear()
    }

    pub fn transcript(&self) -> &Transcript {
        self.session.transcript()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Records the routine request for the current selection.
    pub fn begin_routine(&mut self) -> Result<ChatRequest> {
        if self.selection.is_empty() {
            return Err(AdvisorError::EmptySelection);
        }
        self.claim(RequestKind::Routine)?;
        let prompt = routine_prompt(&self.selection.names());
        info!(products = self.selection.len(), "Requesting routine");
        Ok(self.session.prepare(&prompt))
    }

    /// Gates a follow-up question and records it when it is on topic.
    pub fn begin_question(&mut self, question: &str) -> Result<Submission> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(Submission::Ignored);
        }
        if !self.guard.is_on_topic(question) {
            debug!(question, "Rejected off-topic question");
            return Ok(Submission::Rejected(OFF_TOPIC_REPLY));
        }
        self.claim(RequestKind::FollowUp)?;
        Ok(Submission::Send(self.session.prepare(question)))
    }

    /// Second half of an exchange. Always releases the in-flight slot.
    pub fn complete(&mut self, result: std::result::Result<ChatReply, ChatError>) -> Result<ChatOutcome> {
        let kind = self.in_flight.take().unwrap_or(RequestKind::FollowUp);
        match result.and_then(|reply| self.session.apply(reply, kind)) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, "Chat exchange failed");
                Err(e.into())
            }
        }
    }

    pub async fn generate_routine<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> Result<ChatOutcome> {
        let request = self.begin_routine()?;
        let result = backend.send(&request).await;
        self.complete(result)
    }

    pub async fn ask<B: ChatBackend + ?Sized>(&mut self, backend: &B, question: &str) -> Result<Answer> {
        match self.begin_question(question)? {
            Submission::Send(request) => {
                let result = backend.send(&request).await;
                Ok(Answer::Chat(self.complete(result)?))
            }
            Submission::Rejected(message) => Ok(Answer::Rejected(message)),
            Submission::Ignored => Ok(Answer::Ignored),
        }
    }

    fn claim(&mut self, kind: RequestKind) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(AdvisorError::RequestInFlight);
        }
        self.in_flight = Some(kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::tests::ScriptedBackend;
    use crate::product::sample;
    use crate::{MemorySelectionStore, Role, Turn};

    fn advisor() -> (Advisor, MemorySelectionStore) {
        let catalog = Catalog::new(vec![
            sample("Hydrating Cleanser", "cleanser", "Gentle cleanser"),
            sample("Daily Lotion", "moisturizer", "Light lotion"),
            sample("Lash Paradise", "makeup", "Mascara"),
        ]);
        let store = MemorySelectionStore::new();
        (Advisor::new(catalog, Arc::new(store.clone())), store)
    }

    #[test]
    fn routine_for_two_products() {
        let (mut advisor, _) = advisor();
        advisor.toggle("Hydrating Cleanser").unwrap();
        advisor.toggle("Daily Lotion").unwrap();

        let request = advisor.begin_routine().unwrap();
        assert_eq!(advisor.transcript().len(), 1);
        assert_eq!(
            request.input,
            "Generate a personalized beauty routine using these products: Hydrating Cleanser, Daily Lotion"
        );
        assert!(advisor.is_busy());

        let outcome = advisor.complete(Ok(ChatReply::reply("## AM"))).unwrap();
        assert_eq!(outcome, ChatOutcome::Reply { text: "## AM".into(), copyable: true });
        let roles: Vec<Role> = advisor.transcript().turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
        assert!(!advisor.is_busy());
    }

    #[tokio::test]
    async fn routine_requires_a_selection() {
        let (mut advisor, _) = advisor();
        let backend = ScriptedBackend::new(vec![]);
        let err = advisor.generate_routine(&backend).await.unwrap_err();
        assert!(matches!(err, AdvisorError::EmptySelection));
        assert!(advisor.transcript().is_empty());
    }

    #[test]
    fn second_request_while_one_is_outstanding_is_rejected() {
        let (mut advisor, _) = advisor();
        advisor.toggle("Lash Paradise").unwrap();
        advisor.begin_routine().unwrap();

        assert!(matches!(advisor.begin_routine(), Err(AdvisorError::RequestInFlight)));
        assert!(matches!(
            advisor.begin_question("makeup tips?"),
            Err(AdvisorError::RequestInFlight)
        ));
        assert_eq!(advisor.transcript().len(), 1);
    }

    #[test]
    fn transport_failure_releases_the_slot() {
        let (mut advisor, _) = advisor();
        advisor.toggle("Lash Paradise").unwrap();
        advisor.begin_routine().unwrap();

        let err = advisor.complete(Err(ChatError::Transport("reset".into()))).unwrap_err();
        assert!(matches!(err, AdvisorError::Chat(ChatError::Transport(_))));
        assert!(!advisor.is_busy());
        assert_eq!(advisor.transcript().turns(), [Turn::user(routine_prompt(&["Lash Paradise"]))]);
    }

    #[tokio::test]
    async fn off_topic_question_makes_no_call_and_no_turn() {
        let (mut advisor, _) = advisor();
        let backend = ScriptedBackend::new(vec![]);
        let answer = advisor.ask(&backend, "What's the weather?").await.unwrap();
        assert_eq!(answer, Answer::Rejected(OFF_TOPIC_REPLY));
        assert!(advisor.transcript().is_empty());
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_question_is_ignored() {
        let (mut advisor, _) = advisor();
        let backend = ScriptedBackend::new(vec![]);
        assert_eq!(advisor.ask(&backend, "   ").await.unwrap(), Answer::Ignored);
    }

    #[tokio::test]
    async fn follow_up_is_trimmed_and_not_copyable() {
        let (mut advisor, _) = advisor();
        let backend = ScriptedBackend::new(vec![Ok(ChatReply::reply("Use a mask"))]);
        let answer = advisor.ask(&backend, "  hair care? ").await.unwrap();
        assert_eq!(
            answer,
            Answer::Chat(ChatOutcome::Reply { text: "Use a mask".into(), copyable: false })
        );
        assert_eq!(backend.seen.lock().unwrap()[0].input, "hair care?");
    }

    #[test]
    fn toggle_unknown_product_fails() {
        let (mut advisor, store) = advisor();
        assert!(matches!(advisor.toggle("Ghost"), Err(AdvisorError::UnknownProduct(_))));
        assert!(store.raw().is_none());
    }

    #[test]
    fn stale_selection_can_be_toggled_off() {
        let store = MemorySelectionStore::new();
        store.save(&[sample("Discontinued", "serum", "")]).unwrap();
        let mut advisor = Advisor::new(Catalog::default(), Arc::new(store.clone()));
        assert!(!advisor.toggle("Discontinued").unwrap());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn filter_drives_visible_products() {
        let (mut advisor, _) = advisor();
        advisor.set_category(Some("makeup"));
        assert_eq!(advisor.visible_products().len(), 1);
        advisor.set_category(None);
        advisor.set_search("LOTION");
        assert_eq!(advisor.visible_products()[0].name, "Daily Lotion");
        assert_eq!(advisor.categories(), ["cleanser", "moisturizer", "makeup"]);
    }
}
