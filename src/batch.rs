//! Batch translation over a fixed pool of parallel workers.
//!
//! Extraction and injection stay single-threaded; translation requests are
//! the only concurrent operation. Each worker owns a disjoint,
//! order-preserving contiguous slice of the pending entries so per-worker
//! dialogue context stays locally coherent, and results are applied on the
//! caller's thread.

use crate::{
    constants::CHECKPOINT_INTERVAL,
    types::{Entry, Field, TranslateError},
};
use indexmap::IndexMap;
use log::warn;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc,
};

/// One translation request handed to the external capability.
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    /// Speaker tag and recent dialogue preceding this entry.
    pub context: &'a str,
    pub field: Field,
    pub options: &'a TranslateOptions,
}

/// The external translation capability. Implementations carry their own
/// transport, prompt construction, and retry policy; every call must bound
/// its own waiting time and fail with [`TranslateError`] rather than block
/// indefinitely.
pub trait Translate: Sync {
    fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<String, TranslateError>;
}

/// Client configuration threaded explicitly through every translate call.
#[derive(Debug, Default, Clone)]
pub struct TranslateOptions {
    /// Term → forced translation.
    pub glossary: IndexMap<String, String>,
    /// Character reference block with confirmed pronouns.
    pub actor_context: String,
    /// Target model identifier, passed through to the backend.
    pub model: String,
}

/// Outcome of one batch run. Failed entries stay untranslated and can be
/// retried by running another batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub translated: usize,
    pub failed: usize,
    /// Entries not pending (already translated, reviewed, or skipped) plus
    /// entries with empty originals marked skipped during the run.
    pub skipped: usize,
    pub cancelled: bool,
}

struct Job {
    index: usize,
    text: String,
    context: String,
    field: Field,
}

/// Dispatches pending entries across workers and applies results in place.
pub struct BatchRunner {
    workers: usize,
    checkpoint_interval: usize,
}

impl BatchRunner {
    #[must_use]
    pub const fn new(workers: usize) -> Self {
        Self {
            workers,
            checkpoint_interval: CHECKPOINT_INTERVAL,
        }
    }

    #[must_use]
    pub const fn checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Translates every pending entry. `cancel` is checked between entries:
    /// workers finish their in-flight request, then stop. `checkpoint` is
    /// invoked with the full entry list every N completions so the caller
    /// can persist progress.
    pub fn run<T: Translate>(
        &self,
        entries: &mut [Entry],
        translator: &T,
        options: &TranslateOptions,
        cancel: &AtomicBool,
        mut checkpoint: impl FnMut(&[Entry]),
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut jobs = Vec::new();

        for (index, entry) in entries.iter_mut().enumerate() {
            if !entry.status.is_untranslated() {
                report.skipped += 1;
                continue;
            }

            if entry.original.trim().is_empty() {
                entry.skip();
                report.skipped += 1;
                continue;
            }

            jobs.push(Job {
                index,
                text: entry.original.clone(),
                context: entry.context.clone(),
                field: entry.field,
            });
        }

        if jobs.is_empty() {
            return report;
        }

        let worker_count = self.workers.clamp(1, jobs.len());
        let chunk_size = jobs.len().div_ceil(worker_count);

        let (sender, receiver) = mpsc::channel();
        let mut completed_since_checkpoint = 0usize;

        std::thread::scope(|scope| {
            for chunk in jobs.chunks(chunk_size) {
                let sender = sender.clone();

                scope.spawn(move || {
                    for job in chunk {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }

                        let request = TranslateRequest {
                            text: &job.text,
                            context: &job.context,
                            field: job.field,
                            options,
                        };

                        let result = translator.translate(&request);

                        if sender.send((job.index, result)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(sender);

            for (index, result) in receiver {
                match result {
                    Ok(translation) => {
                        entries[index].set_translation(translation);
                        report.translated += 1;
                        completed_since_checkpoint += 1;

                        if completed_since_checkpoint
                            >= self.checkpoint_interval
                        {
                            completed_since_checkpoint = 0;
                            checkpoint(entries);
                        }
                    }
                    Err(error) => {
                        warn!(
                            "translation failed for {}: {error}",
                            entries[index].id
                        );
                        report.failed += 1;
                    }
                }
            }
        });

        report.cancelled = cancel.load(Ordering::Relaxed);
        report
    }
}
