//! Index lifecycle: create-if-missing, bounded readiness wait, data access
//!
//! An index moves NotExists -> Creating -> Ready. Upserts and queries go
//! through [`RemoteIndex`], which is only handed out once the index is ready.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::service::VectorService;
use super::types::{
    IndexDescription, IndexSpec, IndexStats, Metric, MetadataFilter, QueryMatch, QueryRequest,
    VectorRecord,
};
use crate::error::{EmbedSearchError, Result};

/// Exponential backoff for readiness polling
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay after the first unready poll (default: 2s)
    pub initial_delay: Duration,
    /// Upper bound for a single delay (default: 30s)
    pub max_delay: Duration,
    /// Growth factor between delays (default: 1.5)
    pub multiplier: f64,
    /// Total polls before giving up (default: 30)
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 1.5,
            max_attempts: 30,
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given 1-based failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Shared flag that aborts a readiness wait
///
/// Setting it wakes any thread blocked in [`CancelFlag::sleep`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<CancelState>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let _guard = self.0.lock.lock();
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Block for `duration` or until cancelled, returning `true` if cancelled
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        let mut guard = self.0.lock.lock();
        while !self.is_cancelled() {
            match deadline {
                Some(deadline) => {
                    if self.0.wake.wait_until(&mut guard, deadline).timed_out() {
                        break;
                    }
                }
                None => self.0.wake.wait(&mut guard),
            }
        }
        self.is_cancelled()
    }
}

/// How an existing index differs from the requested spec
#[derive(Debug, Clone, PartialEq)]
pub struct SpecMismatch {
    pub expected_dimension: usize,
    pub actual_dimension: usize,
    pub expected_metric: Metric,
    pub actual_metric: Metric,
}

/// Result of [`ensure_index`]
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureOutcome {
    /// The index was created by this call
    Created,
    /// The index already existed and is reused as-is
    Existing { mismatch: Option<SpecMismatch> },
}

impl EnsureOutcome {
    pub fn created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Create the index unless one with the same name exists
///
/// An existing index is reused without modification, even when its
/// dimension or metric differ from `spec`; the difference is returned in
/// the outcome and logged. A 409 from a concurrent creator counts as
/// existing.
pub fn ensure_index(service: &dyn VectorService, spec: &IndexSpec) -> Result<EnsureOutcome> {
    let existing = service
        .list_indexes()
        .map_err(|e| EmbedSearchError::index_creation(format!("listing indexes: {e}")))?
        .into_iter()
        .find(|ix| ix.name == spec.name);

    if let Some(existing) = existing {
        return Ok(reuse(spec, &existing));
    }

    match service.create_index(spec) {
        Ok(_) => {
            log::info!(
                "Created index {} ({}d, {})",
                spec.name,
                spec.dimension,
                spec.metric
            );
            Ok(EnsureOutcome::Created)
        }
        Err(e) if e.is_conflict() => {
            log::info!("Index {} was created concurrently; reusing it", spec.name);
            let existing = service
                .describe_index(&spec.name)
                .map_err(|e| EmbedSearchError::index_creation(e.to_string()))?;
            Ok(reuse(spec, &existing))
        }
        Err(e) => Err(EmbedSearchError::index_creation(format!(
            "{}: {}",
            spec.name, e
        ))),
    }
}

fn reuse(spec: &IndexSpec, existing: &IndexDescription) -> EnsureOutcome {
    let mismatch = (existing.dimension != spec.dimension || existing.metric != spec.metric)
        .then(|| SpecMismatch {
            expected_dimension: spec.dimension,
            actual_dimension: existing.dimension,
            expected_metric: spec.metric,
            actual_metric: existing.metric,
        });

    if let Some(m) = &mismatch {
        log::warn!(
            "Reusing index {} with {}d/{} but the embedder produces {}d/{}",
            spec.name,
            m.actual_dimension,
            m.actual_metric,
            m.expected_dimension,
            m.expected_metric
        );
    } else {
        log::info!("Using existing index {}", spec.name);
    }

    EnsureOutcome::Existing { mismatch }
}

/// Poll until the index reports ready
///
/// Sleeps per `policy` between polls. Fails with `ReadinessTimeout` after
/// `max_attempts` unready polls and with `Cancelled` once `cancel` is set,
/// including while sleeping between polls.
/// Errors from the readiness check itself are returned immediately.
pub fn wait_until_ready(
    service: &dyn VectorService,
    name: &str,
    policy: &RetryPolicy,
    cancel: &CancelFlag,
) -> Result<IndexDescription> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return Err(EmbedSearchError::Cancelled(format!(
                "waiting for index {name}"
            )));
        }

        let description = service.describe_index(name)?;
        if description.is_ready() {
            log::debug!("Index {} ready after {} polls", name, attempt);
            return Ok(description);
        }

        if attempt == attempts {
            break;
        }

        let delay = policy.delay_for(attempt);
        log::info!(
            "Waiting for index {} to be ready ({:?}, attempt {}/{})...",
            name,
            description.status.state,
            attempt,
            attempts
        );
        if cancel.sleep(delay) {
            return Err(EmbedSearchError::Cancelled(format!(
                "waiting for index {name}"
            )));
        }
    }

    Err(EmbedSearchError::ReadinessTimeout {
        index: name.to_string(),
        attempts,
    })
}

/// Handle to a ready index
pub struct RemoteIndex<'a> {
    service: &'a dyn VectorService,
    description: IndexDescription,
    namespace: String,
}

impl<'a> RemoteIndex<'a> {
    /// Wrap a description returned by [`wait_until_ready`]
    pub fn connect(service: &'a dyn VectorService, description: IndexDescription) -> Result<Self> {
        if !description.is_ready() {
            return Err(EmbedSearchError::invalid(format!(
                "index {} is not ready",
                description.name
            )));
        }
        Ok(Self {
            service,
            description,
            namespace: String::new(),
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn dimension(&self) -> usize {
        self.description.dimension
    }

    pub fn metric(&self) -> Metric {
        self.description.metric
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        if len != self.description.dimension {
            return Err(EmbedSearchError::dimension(self.description.dimension, len));
        }
        Ok(())
    }

    /// Upsert in batches of `batch_size`, returning the total upserted
    pub fn upsert(&self, records: &[VectorRecord], batch_size: usize) -> Result<usize> {
        for record in records {
            self.check_dimension(record.values.len())?;
        }

        let mut total = 0;
        for batch in records.chunks(batch_size.max(1)) {
            total += self
                .service
                .upsert(self.name(), &self.namespace, batch)
                .map_err(|e| EmbedSearchError::upsert(e.to_string()))?;
        }

        log::info!("Upserted {} vectors into {}", total, self.name());
        Ok(total)
    }

    /// Top-k nearest records, best first
    pub fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        include_metadata: bool,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        self.check_dimension(vector.len())?;

        let mut request = QueryRequest::new(vector, top_k);
        request.include_metadata = include_metadata;
        request.filter = filter;
        request.namespace = self.namespace.clone();

        let response = self
            .service
            .query(self.name(), &request)
            .map_err(|e| EmbedSearchError::query(e.to_string()))?;

        let mut matches = response.matches;
        matches.truncate(top_k);
        Ok(matches)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        self.service
            .describe_index_stats(self.name())
            .map_err(|e| EmbedSearchError::stats(e.to_string()))
    }
}
