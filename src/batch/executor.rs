//! Batch executor.

use crate::{Error, Result};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

/// How a batch was actually carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// The bulk endpoint answered.
    Batched,
    /// The bulk endpoint was unavailable; items were sent one by one.
    Sequential,
}

#[derive(Debug)]
pub struct BatchResult<T> {
    pub successes: Vec<(usize, T)>,
    pub failures: Vec<(usize, Error)>,
    pub mode: BatchMode,
    pub execution_time: Duration,
    pub total_processed: usize,
}

impl<T> BatchResult<T> {
    fn new(mode: BatchMode) -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
            mode,
            execution_time: Duration::ZERO,
            total_processed: 0,
        }
    }
    pub fn add_success(&mut self, i: usize, r: T) {
        self.successes.push((i, r));
    }
    pub fn add_failure(&mut self, i: usize, e: Error) {
        self.failures.push((i, e));
    }
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.successes.len() as f64 / self.total_processed as f64
        }
    }
}

/// Bulk call with a sequential per-item fallback.
#[derive(Debug, Clone)]
pub struct BatchFallback {
    fallback_statuses: Vec<u16>,
    continue_on_error: bool,
}

impl Default for BatchFallback {
    fn default() -> Self {
        Self {
            fallback_statuses: vec![404, 405, 501],
            continue_on_error: true,
        }
    }
}

impl BatchFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses that mean "no bulk endpoint in this API version".
    pub fn with_fallback_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.fallback_statuses = statuses.into();
        self
    }

    /// Keep going after a failed item in sequential mode (default `true`).
    pub fn with_continue_on_error(mut self, c: bool) -> Self {
        self.continue_on_error = c;
        self
    }

    pub fn should_fall_back(&self, err: &Error) -> bool {
        err.status()
            .map(|s| self.fallback_statuses.contains(&s))
            .unwrap_or(false)
    }

    /// Run `batch` over all items; on an "endpoint unavailable" error run
    /// `single` for each item in order. Any other bulk error is returned as is.
    ///
    /// Each single call goes through the client normally, so it is retried
    /// and counted by its own endpoint's breaker like any other call.
    pub async fn run<I, T, B, BFut, S, SFut>(
        &self,
        items: &[I],
        batch: B,
        single: S,
    ) -> Result<BatchResult<T>>
    where
        I: Clone,
        B: FnOnce(Vec<I>) -> BFut,
        BFut: Future<Output = Result<Vec<T>>>,
        S: Fn(I) -> SFut,
        SFut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let total = items.len();

        match batch(items.to_vec()).await {
            Ok(results) => {
                let mut result = BatchResult::new(BatchMode::Batched);
                for (i, r) in results.into_iter().enumerate() {
                    result.add_success(i, r);
                }
                result.execution_time = start.elapsed();
                result.total_processed = total;
                Ok(result)
            }
            Err(err) if self.should_fall_back(&err) => {
                info!(
                    http_status = err.status().unwrap_or(0),
                    items = total,
                    "bulk endpoint unavailable, falling back to per-item calls"
                );
                let mut result = self.execute_sequential(items, single).await;
                result.execution_time = start.elapsed();
                Ok(result)
            }
            Err(err) => Err(err),
        }
    }

    async fn execute_sequential<I, T, S, SFut>(&self, items: &[I], single: S) -> BatchResult<T>
    where
        I: Clone,
        S: Fn(I) -> SFut,
        SFut: Future<Output = Result<T>>,
    {
        let mut result = BatchResult::new(BatchMode::Sequential);
        for (i, item) in items.iter().cloned().enumerate() {
            match single(item).await {
                Ok(r) => result.add_success(i, r),
                Err(e) => {
                    let canceled = matches!(e, Error::Canceled { .. });
                    result.add_failure(i, e);
                    if canceled || !self.continue_on_error {
                        break;
                    }
                }
            }
        }
        result.total_processed = items.len();
        result
    }
}
