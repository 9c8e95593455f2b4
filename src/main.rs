use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use routine_advisor::{
    Advisor, AdvisorConfig, Answer, Catalog, ChatOutcome, HttpChatBackend, MemorySelectionStore,
    SledSelectionStore, filter, markdown, server,
};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "routine-advisor", version, about = "Product picker and beauty-routine chat")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog file or URL (overrides configuration)
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the widget API and static assets
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Render chat markdown to HTML (stdin when FILE is omitted)
    Render { file: Option<PathBuf> },
    /// List catalog products matching a filter
    Products {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Ask follow-up questions from the terminal
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = AdvisorConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(catalog) = cli.catalog {
        config.catalog = catalog;
    }

    match cli.command {
        Command::Serve { bind, static_dir } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if static_dir.is_some() {
                config.static_dir = static_dir;
            }
            run_server(&config).await
        }
        Command::Render { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            println!("{}", markdown::render(&text));
            Ok(())
        }
        Command::Products { category, search } => {
            let catalog = Catalog::load(&config.catalog).await.context("Failed to load catalog")?;
            let filter = filter::FilterState::new(category.as_deref(), &search);
            let view = filter::filtered_view(catalog.products(), &filter);
            if view.is_empty() {
                println!("{}", filter::NO_MATCHES);
            }
            for p in view {
                println!("{} ({}) [{}]", p.name, p.brand, p.category);
            }
            Ok(())
        }
        Command::Chat => run_chat(&config).await,
    }
}

async fn run_server(config: &AdvisorConfig) -> Result<()> {
    let catalog = Catalog::load(&config.catalog).await.context("Failed to load catalog")?;
    let store = SledSelectionStore::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    let backend = HttpChatBackend::new(config.chat_endpoint.clone(), config.request_timeout())?;
    let advisor = Advisor::new(catalog, Arc::new(store));

    let mut router = server::router(server::AppState::new(advisor, Arc::new(backend)));
    if let Some(dir) = &config.static_dir {
        router = server::with_static(router, dir);
    }
    server::serve(router, &config.bind).await?;
    Ok(())
}

async fn run_chat(config: &AdvisorConfig) -> Result<()> {
    let backend = HttpChatBackend::new(config.chat_endpoint.clone(), config.request_timeout())?;
    let mut advisor = Advisor::new(Catalog::default(), Arc::new(MemorySelectionStore::new()));

    println!("--- Routine Advisor ---");
    println!("Ask about skincare, makeup, hair or fragrance. Empty line to quit.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok(());
        }
        match advisor.ask(&backend, &line).await {
            Ok(Answer::Chat(ChatOutcome::Reply { text, .. })) => println!("{text}\n"),
            Ok(Answer::Chat(ChatOutcome::BackendError { message })) => println!("{message}\n"),
            Ok(Answer::Rejected(message)) => println!("{message}\n"),
            Ok(Answer::Ignored) => {}
            Err(e) => println!("[chat] Failed: {e}\n"),
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}
