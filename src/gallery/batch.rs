use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::image::ImageFile;
use crate::error::AppResult;
use crate::events::ProgressPayload;

/// Something that turns an image into its enhanced bytes.
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, file: &ImageFile) -> AppResult<Bytes>;
}

/// Settlement of one call in a batch.
#[derive(Debug)]
pub struct EnhanceOutcome {
    pub id: Uuid,
    pub result: AppResult<Bytes>,
}

/// Completed-over-total counter shared by the calls of one batch.
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Records one settlement, success or not.
    pub fn complete_one(&self) -> ProgressPayload {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        ProgressPayload {
            completed,
            total: self.total,
            percent: percent(completed, self.total),
        }
    }
}

fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Fires one call per image, waits for all of them and returns every
/// settlement in snapshot order. A failed call never aborts the others.
pub async fn run_batch(
    enhancer: &dyn Enhancer,
    snapshot: Vec<(Uuid, ImageFile)>,
    on_progress: &(dyn Fn(ProgressPayload) + Send + Sync),
) -> Vec<EnhanceOutcome> {
    let progress = Progress::new(snapshot.len());
    let progress = &progress;

    let calls = snapshot.into_iter().map(|(id, file)| async move {
        let result = enhancer.enhance(&file).await;
        if let Err(e) = &result {
            log::error!("Error enhancing image {}: {}", file.name, e);
        }
        on_progress(progress.complete_one());
        EnhanceOutcome { id, result }
    });

    join_all(calls).await
}
