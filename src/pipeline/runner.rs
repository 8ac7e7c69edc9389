//! Per-run orchestration.
//!
//! One invocation drives: list unread → drop already-delivered →
//! fetch + classify → sort by importance → enrich → deliver → mark.
//! A message failure never aborts the run; an unmarked message is
//! simply retried on the next invocation.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, PipelineError};
use crate::ledger::StateLedger;
use crate::pipeline::actions::ActionStrategy;
use crate::pipeline::classifier::RuleClassifier;
use crate::pipeline::dates::DateResolver;
use crate::pipeline::engine::ExtractionEngine;
use crate::pipeline::event::EventStrategy;
use crate::pipeline::sentiment::SentimentStrategy;
use crate::pipeline::summary::SummaryStrategy;
use crate::pipeline::types::{EnrichmentRecord, Message, COLUMNS};
use crate::providers::{CalendarProvider, DeliveryStore, MailProvider};

/// Counts reported at the end of every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows durably appended and ledger-marked this run.
    pub delivered: usize,
    /// Messages left unmarked for retry on the next run.
    pub failed: usize,
    /// Unread ids dropped because the ledger already has them.
    pub skipped: usize,
}

/// Drives the enrichment pipeline for one run.
pub struct PipelineRunner {
    config: Config,
    mail: Arc<dyn MailProvider>,
    store: Arc<dyn DeliveryStore>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    classifier: RuleClassifier,
    engine: ExtractionEngine,
    ledger: StateLedger,
    summary: SummaryStrategy,
    actions: ActionStrategy,
    sentiment: SentimentStrategy,
    event: EventStrategy,
}

impl PipelineRunner {
    pub fn new(
        config: Config,
        mail: Arc<dyn MailProvider>,
        store: Arc<dyn DeliveryStore>,
        calendar: Option<Arc<dyn CalendarProvider>>,
        classifier: RuleClassifier,
        engine: ExtractionEngine,
        ledger: StateLedger,
    ) -> Self {
        let resolver = DateResolver::new();
        Self::with_resolver(config, mail, store, calendar, classifier, engine, ledger, resolver)
    }

    /// Like [`new`](Self::new) with an explicit date resolver, so runs
    /// can be replayed against a fixed "today".
    #[allow(clippy::too_many_arguments)]
    pub fn with_resolver(
        config: Config,
        mail: Arc<dyn MailProvider>,
        store: Arc<dyn DeliveryStore>,
        calendar: Option<Arc<dyn CalendarProvider>>,
        classifier: RuleClassifier,
        engine: ExtractionEngine,
        ledger: StateLedger,
        resolver: DateResolver,
    ) -> Self {
        let actions = ActionStrategy::new(resolver.clone());
        let event = EventStrategy::new(
            resolver,
            config.default_event_time,
            config.default_event_duration_min,
        );
        Self {
            config,
            mail,
            store,
            calendar,
            classifier,
            engine,
            ledger,
            summary: SummaryStrategy,
            actions,
            sentiment: SentimentStrategy,
            event,
        }
    }

    /// All-time delivery statistics from the ledger.
    pub fn ledger_stats(&self) -> (u64, Option<String>) {
        (
            self.ledger.total_processed(),
            self.ledger.last_run().map(str::to_string),
        )
    }

    /// Execute one full run.
    pub async fn run(&mut self) -> Result<RunSummary, Error> {
        self.store.ensure_schema(&COLUMNS).await?;

        let unread = self.mail.list_unread(self.config.fetch_limit).await?;
        let fresh = self.ledger.filter_undelivered(&unread);
        let skipped = unread.len() - fresh.len();
        if skipped > 0 {
            info!(skipped, "dropped already-delivered messages");
        }

        if fresh.is_empty() {
            info!("no new messages");
            self.finish_run();
            return Ok(RunSummary {
                skipped,
                ..RunSummary::default()
            });
        }

        // First pass: fetch and classify. A fetch failure costs only
        // that message; classification itself is total.
        let mut failed = 0;
        let mut batch: Vec<(Message, String, u8)> = Vec::with_capacity(fresh.len());
        for id in &fresh {
            match self.mail.fetch(id).await {
                Ok(message) => {
                    let (category, importance) = self.classifier.classify(&message);
                    debug!(id = %id, category = %category, importance, "classified");
                    batch.push((message, category, importance));
                }
                Err(e) => {
                    error!(id = %id, error = %e, "fetch failed, will retry next run");
                    failed += 1;
                }
            }
        }

        // Highest importance first; stable, so equal weights keep
        // mailbox order. If the run is interrupted, the important
        // rows are already delivered.
        batch.sort_by(|a, b| b.2.cmp(&a.2));
        info!(count = batch.len(), "processing messages by priority");

        let mut delivered = 0;
        for (index, (message, category, importance)) in batch.into_iter().enumerate() {
            // External model rate limit: pace between messages, never
            // before the first.
            if index > 0 && self.engine.has_model() {
                tokio::time::sleep(self.config.pacing).await;
            }

            match self.enrich_and_deliver(&message, category, importance).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    error!(id = %message.id, error = %e, "message failed, left for retry");
                    failed += 1;
                }
            }
        }

        self.finish_run();

        let summary = RunSummary {
            delivered,
            failed,
            skipped,
        };
        info!(
            delivered = summary.delivered,
            failed = summary.failed,
            skipped = summary.skipped,
            "run complete"
        );
        Ok(summary)
    }

    /// Enrich one message and deliver its row. On success the ledger
    /// is marked and persisted before anything else can go wrong.
    async fn enrich_and_deliver(
        &mut self,
        message: &Message,
        category: String,
        importance: u8,
    ) -> Result<(), PipelineError> {
        let summary = self.engine.run(&self.summary, message).await;
        let actions = self.engine.run(&self.actions, message).await;
        let reading = self.engine.run(&self.sentiment, message).await;

        // Event gating looks at the raw text only.
        let event = if self.event.detect(message) {
            self.engine.run(&self.event, message).await
        } else {
            None
        };

        let event_created = match (&event, &self.calendar) {
            (Some(ev), Some(calendar)) => match calendar.create_event(ev).await {
                Ok(link) if link == "DryRun" => "DryRun".to_string(),
                Ok(link) => {
                    debug!(id = %message.id, link = %link, "calendar event created");
                    "Yes".to_string()
                }
                Err(e) => {
                    warn!(id = %message.id, error = %e, "calendar event creation failed");
                    "Failed".to_string()
                }
            },
            _ => "No".to_string(),
        };

        let record = EnrichmentRecord {
            category,
            importance,
            summary,
            actions: actions.actions,
            due_date: actions.due_date,
            sentiment: reading.sentiment,
            urgency_score: reading.urgency_score,
            event,
            event_created,
        };

        self.store
            .append_row(&record.to_row(message))
            .await
            .map_err(|e| PipelineError::Delivery(e.to_string()))?;

        // The row is durable: mark and persist immediately so a crash
        // after this point cannot cause a redelivery.
        self.ledger.mark_delivered(&message.id);
        if let Err(e) = self.ledger.persist() {
            warn!(error = %e, "ledger persist failed, retrying at run end");
        }

        if let Err(e) = self.mail.mark_read(&message.id).await {
            warn!(id = %message.id, error = %e, "failed to mark message read");
        }

        info!(
            id = %message.id,
            category = %record.category,
            sentiment = record.sentiment.as_str(),
            "delivered"
        );
        Ok(())
    }

    /// Compact and persist the ledger at the end of a run.
    fn finish_run(&mut self) {
        self.ledger.compact(self.config.ledger_keep);
        if let Err(e) = self.ledger.persist() {
            error!(error = %e, "final ledger persist failed");
        }
    }
}
