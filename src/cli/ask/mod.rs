//! Ask command - answers one question on the terminal
//!
//! Logs go to stderr so stdout carries only the answer. Ctrl+C cancels the
//! run at the next phase boundary.

use std::fmt::Write as _;

use anyhow::Context;
use clap::{Args, ValueEnum};
use tokio::signal;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{AgentResponse, CancellationToken, Degradation, RoutingHint};
use crate::infrastructure::logging::init_logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question, in Danish or English
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Hint that the question concerns recent changes
    #[arg(long)]
    pub prefer_fresh: bool,
}

impl AskArgs {
    pub fn question(&self) -> String {
        self.words.join(" ")
    }
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    let state = crate::create_app_state(&config).await?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let hint = args.prefer_fresh.then_some(RoutingHint::PreferFresh);
    let response = state.questions.ask(&args.question(), hint, &cancel).await;
    watcher.abort();
    let response = response?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => print!("{}", render_text(&response)),
    }

    if response.is_error() {
        anyhow::bail!("The question could not be answered");
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, cancelling");
            cancel.cancel();
        }
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

/// Plain-text rendering: answer, sources, then any degradation notes
pub fn render_text(response: &AgentResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", response.answer.trim());

    if !response.citations.is_empty() {
        let _ = writeln!(out, "\nKilder:");
        for citation in &response.citations {
            let title = citation.title.as_deref().unwrap_or(&citation.source.document);
            let _ = writeln!(
                out,
                "  [{}] {} ({}, {})",
                citation.marker, title, citation.provenance, citation.source
            );
        }
    }

    for degradation in &response.degradations {
        let message = match degradation {
            Degradation::ProviderDegraded { message }
            | Degradation::JudgmentUnavailable { message } => message,
        };
        let _ = writeln!(out, "\nNote ({}): {}", degradation.kind(), message);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Citation, EvidenceItem, EvidenceScores, Provenance, SourceId};

    #[test]
    fn test_render_text_lists_sources() {
        let item = EvidenceItem::new(
            SourceId::new("br18-rumhøjde", 2),
            "Loftshøjden skal være mindst 2,5 m.",
            Provenance::Local,
            EvidenceScores::new(0.9, 0.8, 1.0),
        )
        .with_title("Rumhøjde");
        let response = AgentResponse::answered(
            "Mindst 2,5 m [1].",
            vec![Citation::from_item(1, &item)],
        )
        .with_degradations(vec![Degradation::provider("HTTP 503")]);

        let text = render_text(&response);

        assert!(text.starts_with("Mindst 2,5 m [1].\n"));
        assert!(text.contains("[1] Rumhøjde (local, br18-rumhøjde#2)"));
        assert!(text.contains("Note (provider_degraded): HTTP 503"));
    }

    #[test]
    fn test_render_text_without_citations() {
        let response = AgentResponse::insufficient_evidence("Ingen kilder.");

        assert_eq!(render_text(&response), "Ingen kilder.\n");
    }
}
