use std::sync::Arc;

use anyhow::Context;

use mailsift::config::Config;
use mailsift::ledger::StateLedger;
use mailsift::llm::create_model;
use mailsift::pipeline::classifier::RuleClassifier;
use mailsift::pipeline::engine::ExtractionEngine;
use mailsift::pipeline::runner::PipelineRunner;
use mailsift::providers::{CalendarProvider, CsvStore, IcsCalendar, JsonMailbox};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📧 mailsift v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Inbox:  {}", config.inbox_path.display());
    eprintln!("   Output: {}", config.output_path.display());
    eprintln!("   Ledger: {}", config.ledger_path.display());
    eprintln!(
        "   Model:  {}",
        config
            .llm
            .as_ref()
            .map_or("none (deterministic only)", |s| s.model.as_str())
    );

    // Missing inbox is fatal: nothing to run against.
    let mailbox = JsonMailbox::open(&config.inbox_path, config.max_body_chars)
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            eprintln!("  Point MAILSIFT_INBOX at a mailbox file.");
            std::process::exit(1);
        });

    let store = CsvStore::new(&config.output_path);
    let calendar: Arc<dyn CalendarProvider> = Arc::new(IcsCalendar::new(
        &config.calendar_path,
        config.calendar_dry_run,
    ));

    let engine = ExtractionEngine::new(create_model(config.llm.as_ref()));
    let ledger = StateLedger::open(&config.ledger_path);

    let mut runner = PipelineRunner::new(
        config,
        Arc::new(mailbox),
        Arc::new(store),
        Some(calendar),
        RuleClassifier::default_rules(),
        engine,
        ledger,
    );

    let summary = runner.run().await.context("run failed")?;

    println!();
    println!("Run summary:");
    println!("   delivered: {}", summary.delivered);
    println!("   failed:    {} (retried next run)", summary.failed);
    println!("   skipped:   {} (already delivered)", summary.skipped);

    let (total, last_run) = runner.ledger_stats();
    println!();
    println!("All-time:");
    println!("   total delivered: {total}");
    println!("   last run:        {}", last_run.as_deref().unwrap_or("never"));

    Ok(())
}
