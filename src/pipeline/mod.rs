//! Message enrichment pipeline.
//!
//! Every unread message flows through:
//! 1. `RuleClassifier::classify()` — category + importance (no model)
//! 2. priority sort — highest importance delivered first
//! 3. `ExtractionEngine::run()` per task — model first, rules fallback
//! 4. durable delivery — one row appended, ledger marked on success

pub mod actions;
pub mod classifier;
pub mod dates;
pub mod engine;
pub mod event;
pub mod runner;
pub mod sentiment;
pub mod summary;
pub mod types;
