//! Permit-bounded batch uploads
//!
//! `Limiter` is a counting permit pool: acquire before issuing a network
//! request, and the permit releases on every exit path (success, failure,
//! cancellation) through its RAII guard. `BatchUploader` fans a list of
//! uploads out in waves of at most the configured concurrency; wave N+1
//! never starts before all of wave N's requests have completed, which
//! keeps the in-flight count deterministic.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use stowage_core::{FileRecord, StowageResult};

use crate::upload::{UploadOptions, UploadPipeline};

/// One batch member: file name, payload, per-file options
pub type BatchItem = (String, Vec<u8>, UploadOptions);

/// Counting permit pool bounding simultaneous network operations
#[derive(Clone)]
pub struct Limiter {
    permits: Arc<Semaphore>,
}

impl Limiter {
    /// A limit of zero can never make progress, so it is clamped to one
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Wait for a permit. The returned guard releases it when dropped,
    /// including when the holding task is cancelled.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        // The semaphore is never closed, so acquisition cannot fail
        self.permits
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore closed")
    }

    /// Permits currently available
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Fans uploads out across an [`UploadPipeline`] under a concurrency bound
pub struct BatchUploader {
    pipeline: Arc<UploadPipeline>,
}

impl BatchUploader {
    pub fn new(pipeline: Arc<UploadPipeline>) -> Self {
        Self { pipeline }
    }

    /// Upload every item and return their records in input order.
    ///
    /// Fail-fast: the first failing upload aborts the batch and surfaces
    /// its error; already-completed uploads from earlier waves stay in the
    /// store, there is no compensating delete.
    pub async fn upload_many(
        &self,
        files: Vec<BatchItem>,
        concurrency: usize,
    ) -> StowageResult<Vec<FileRecord>> {
        let limit = concurrency.max(1);
        let limiter = Limiter::new(limit);
        let total = files.len();
        debug!(total, limit, "starting batch upload");

        let mut records = Vec::with_capacity(total);
        let mut queue = files.into_iter();
        loop {
            let wave: Vec<BatchItem> = queue.by_ref().take(limit).collect();
            if wave.is_empty() {
                break;
            }

            let uploads = wave.into_iter().map(|(file_name, bytes, options)| {
                let limiter = limiter.clone();
                let pipeline = Arc::clone(&self.pipeline);
                async move {
                    let _permit = limiter.acquire().await;
                    pipeline.upload(&file_name, bytes, options).await
                }
            });
            records.extend(futures::future::try_join_all(uploads).await?);
        }

        debug!(total, "batch upload complete");
        Ok(records)
    }
}
