//! Celebrity Chat - talk to a famous person through an OpenAI-style API
//!
//! The terminal collects a celebrity name, an opening question and a
//! creativity level, then relays the conversation until the user exits.

mod llm;
mod runtime;
mod state_machine;
mod terminal;
mod transcript;

use llm::LlmConfig;
use terminal::Terminal;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

fn init_logging() {
    let json = std::env::var("CELEBRITY_CHAT_LOG_FORMAT")
        .is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "celebrity_chat=warn".into()),
        )
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = LlmConfig::from_env()?;
    tracing::info!(
        model = %config.model,
        profile = %config.profile,
        base_url = %config.base_url,
        "Configuration loaded"
    );

    let mut terminal = Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    terminal.launch(&config).await?;

    tracing::info!("Chat ended");
    Ok(())
}
