//! Run pipeline: extract every message, dead-letter failures, aggregate once.
//!
//! Each message ends up as exactly one transaction or exactly one dead-letter
//! record. Nothing is held across runs.

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use momo_core::time::now_local;
use momo_core::{DeadLetterRecord, RawMessage, StatsSnapshot, Transaction};
use momo_ingest::SmsExtractor;

use crate::dead_letter::DeadLetterSink;
use crate::stats::aggregate;

/// Counts an operator sees after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub messages_read: usize,
    pub transactions_extracted: usize,
    pub dead_lettered: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {} messages: {} transactions extracted, {} dead-lettered",
            self.messages_read, self.transactions_extracted, self.dead_lettered
        )
    }
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub messages_read: usize,
    pub transactions: Vec<Transaction>,
    pub dead_letters: Vec<DeadLetterRecord>,
    pub stats: StatsSnapshot,
}

impl RunOutcome {
    pub fn report(&self) -> RunReport {
        RunReport {
            messages_read: self.messages_read,
            transactions_extracted: self.transactions.len(),
            dead_lettered: self.dead_letters.len(),
        }
    }
}

#[derive(Debug)]
pub struct Pipeline<S> {
    extractor: SmsExtractor,
    sink: S,
}

impl<S: DeadLetterSink> Pipeline<S> {
    pub fn new(extractor: SmsExtractor, sink: S) -> Self {
        Self { extractor, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process a batch sequentially, then aggregate.
    ///
    /// A failing sink is logged; the message still counts as dead-lettered.
    pub fn run(&mut self, messages: impl IntoIterator<Item = RawMessage>) -> RunOutcome {
        let tz = self.extractor.timezone();
        let mut messages_read = 0;
        let mut transactions = Vec::new();
        let mut dead_letters = Vec::new();

        for message in messages {
            messages_read += 1;
            match self.extractor.extract(&message) {
                Ok(txn) => transactions.push(txn),
                Err(failure) => {
                    error!(
                        error = %failure.error,
                        address = %failure.message.address,
                        "error extracting transaction details"
                    );
                    let record = DeadLetterRecord::from_failure(failure, now_local(tz));
                    if let Err(e) = self.sink.record(&record) {
                        error!(error = %e, "error saving to dead letter queue");
                    }
                    dead_letters.push(record);
                }
            }
        }

        if transactions.is_empty() {
            warn!(messages_read, "no transactions extracted");
        }

        let stats = aggregate(&transactions);
        let outcome = RunOutcome {
            messages_read,
            transactions,
            dead_letters,
            stats,
        };
        info!(report = %outcome.report(), "processed MoMo messages");
        outcome
    }
}
