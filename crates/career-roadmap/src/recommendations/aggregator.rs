use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::domain::{BatchOutcome, CandidateFields, Category, ScoredRequest};
use super::lookup::{DetailLookup, LookupError};

/// Timeouts applied to each aggregation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Upper bound for a single lookup; expiry counts as a failed lookup.
    pub lookup_timeout: Duration,
    /// Optional bound for the whole batch. On expiry the batch finalizes with
    /// whatever has arrived and outstanding lookups are aborted.
    pub batch_deadline: Option<Duration>,
}

impl AggregatorConfig {
    pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Self::DEFAULT_LOOKUP_TIMEOUT,
            batch_deadline: None,
        }
    }
}

/// Fans a batch of scored candidates out to concurrent lookups and joins the
/// successful ones back into a single ranked list.
#[derive(Clone)]
pub struct Aggregator {
    category: Category,
    lookup: Arc<dyn DetailLookup>,
    config: AggregatorConfig,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("category", &self.category)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    pub fn new(category: Category, lookup: Arc<dyn DetailLookup>, config: AggregatorConfig) -> Self {
        Self {
            category,
            lookup,
            config,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Resolve every request concurrently and return them ranked by score.
    ///
    /// Failed lookups are dropped. Equal scores keep their input order, so the
    /// ranking never depends on which lookup finished first.
    pub async fn run_batch(&self, requests: Vec<ScoredRequest>) -> BatchOutcome {
        if requests.is_empty() {
            debug!(category = %self.category, "empty recommendation batch");
            return BatchOutcome::no_data(self.category);
        }

        let total = requests.len();
        let (done_tx, done_rx) = oneshot::channel();
        let state = Arc::new(Mutex::new(BatchState::collecting(total, done_tx)));

        let handles: Vec<_> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let slot = PendingSlot {
                    state: Arc::clone(&state),
                    category: self.category,
                    index,
                    request,
                    reported: false,
                };
                let lookup = Arc::clone(&self.lookup);
                let timeout = self.config.lookup_timeout;
                tokio::spawn(resolve(slot, lookup, timeout))
            })
            .collect();

        let deadline_expired = match self.config.batch_deadline {
            Some(deadline) => tokio::time::timeout(deadline, done_rx).await.is_err(),
            None => {
                let _ = done_rx.await;
                false
            }
        };

        if deadline_expired {
            warn!(category = %self.category, "recommendation batch deadline expired; finalizing early");
            for handle in &handles {
                handle.abort();
            }
        }

        let mut collected = lock(&state).finish();
        collected.sort_by(|a, b| {
            b.request
                .score
                .cmp(&a.request.score)
                .then_with(|| a.index.cmp(&b.index))
        });

        let resolved = collected.len();
        metrics::histogram!("recommendation_batch_results", "category" => self.category.slug())
            .record(resolved as f64);
        debug!(
            category = %self.category,
            requested = total,
            resolved,
            "recommendation batch complete"
        );

        let ranked = collected
            .into_iter()
            .map(|entry| (entry.request, entry.fields))
            .collect();
        BatchOutcome::ranked(self.category, ranked, deadline_expired)
    }
}

async fn resolve(mut slot: PendingSlot, lookup: Arc<dyn DetailLookup>, timeout: Duration) {
    let id = slot.request.id;
    let result = match tokio::time::timeout(timeout, lookup.lookup(id)).await {
        Ok(result) => result,
        Err(_) => Err(LookupError::TimedOut(timeout)),
    };
    slot.report(result);
}

struct Collected {
    index: usize,
    request: ScoredRequest,
    fields: CandidateFields,
}

enum BatchPhase {
    Collecting {
        pending: usize,
        done: Option<oneshot::Sender<()>>,
    },
    Complete,
}

struct BatchState {
    phase: BatchPhase,
    collected: Vec<Collected>,
}

impl BatchState {
    fn collecting(pending: usize, done: oneshot::Sender<()>) -> Self {
        Self {
            phase: BatchPhase::Collecting {
                pending,
                done: Some(done),
            },
            collected: Vec::with_capacity(pending),
        }
    }

    /// Count one lookup as finished. Reports arriving after completion are
    /// ignored.
    fn record(&mut self, index: usize, request: ScoredRequest, fields: Option<CandidateFields>) {
        let BatchPhase::Collecting { pending, done } = &mut self.phase else {
            return;
        };

        if let Some(fields) = fields {
            self.collected.push(Collected {
                index,
                request,
                fields,
            });
        }

        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            if let Some(done) = done.take() {
                let _ = done.send(());
            }
        }
    }

    fn finish(&mut self) -> Vec<Collected> {
        self.phase = BatchPhase::Complete;
        mem::take(&mut self.collected)
    }
}

/// One outstanding lookup. Dropping it unreported (panic or abort) still
/// counts it as a failure so the join cannot stall.
struct PendingSlot {
    state: Arc<Mutex<BatchState>>,
    category: Category,
    index: usize,
    request: ScoredRequest,
    reported: bool,
}

impl PendingSlot {
    fn report(&mut self, result: Result<CandidateFields, LookupError>) {
        let category = self.category.slug();
        let fields = match result {
            Ok(fields) => {
                metrics::counter!("recommendation_lookups_total", "category" => category, "outcome" => "ok")
                    .increment(1);
                Some(fields)
            }
            Err(err) => {
                metrics::counter!("recommendation_lookups_total", "category" => category, "outcome" => "failed")
                    .increment(1);
                warn!(
                    category,
                    id = self.request.id,
                    error = %err,
                    "detail lookup failed; dropping candidate"
                );
                None
            }
        };

        self.reported = true;
        lock(&self.state).record(self.index, self.request, fields);
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        if !self.reported {
            self.report(Err(LookupError::Abandoned));
        }
    }
}

fn lock(state: &Mutex<BatchState>) -> std::sync::MutexGuard<'_, BatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
