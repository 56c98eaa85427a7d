use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AppResult;
use crate::events::{
    AppEvent, BatchState, GalleryChangedPayload, ProgressPayload, StateChangedPayload,
};
use crate::gallery::batch::run_batch;
use crate::gallery::collection::{BatchReport, GalleryState};
use crate::gallery::image::ImageFile;
use crate::AppState;

pub fn download_filename(index: usize) -> String {
    format!("enhanced_image_{}.png", index + 1)
}

pub async fn get_gallery(state: &AppState) -> AppResult<GalleryState> {
    let gallery = state.gallery.read().await;
    Ok(gallery.state())
}

pub async fn add_images(state: &AppState, files: Vec<ImageFile>) -> AppResult<usize> {
    let mut gallery = state.gallery.write().await;
    let added = gallery.add_images(files);
    let len = gallery.len();
    drop(gallery);

    log::info!("[add_images] added {}, gallery now {}", added, len);
    state
        .events
        .emit(AppEvent::GalleryChanged(GalleryChangedPayload { len }));
    Ok(added)
}

/// Reads files from disk, then adds them like a drop would.
pub async fn add_paths(state: &AppState, paths: &[PathBuf]) -> AppResult<usize> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(ImageFile::from_path(path).await?);
    }
    add_images(state, files).await
}

pub async fn remove_image(state: &AppState, index: usize) -> AppResult<()> {
    let mut gallery = state.gallery.write().await;
    let removed = gallery.remove_image(index);
    let len = gallery.len();
    drop(gallery);

    if let Some(image) = removed {
        log::info!("[remove_image] removed {} at {}", image.file.name, index);
        state
            .events
            .emit(AppEvent::GalleryChanged(GalleryChangedPayload { len }));
    }
    Ok(())
}

/// Sends every image at once and commits all results after the last one settles.
pub async fn enhance_all(state: &AppState) -> AppResult<BatchReport> {
    let snapshot = {
        let mut gallery = state.gallery.write().await;
        gallery.begin_batch()?
    };
    log::info!("[enhance_all] {} images", snapshot.len());
    state.events.emit(AppEvent::StateChanged(StateChangedPayload {
        state: BatchState::Enhancing,
    }));

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressPayload>();
    let enhancer = Arc::clone(&state.enhancer);

    let batch = async move {
        let on_progress = move |p: ProgressPayload| {
            let _ = progress_tx.send(p);
        };
        run_batch(enhancer.as_ref(), snapshot, &on_progress).await
    };

    let track = async {
        while let Some(p) = progress_rx.recv().await {
            state.gallery.write().await.set_progress(p.percent);
            state.events.emit(AppEvent::Progress(p));
        }
    };

    let (outcomes, ()) = tokio::join!(batch, track);

    let mut gallery = state.gallery.write().await;
    let report = gallery.commit_batch(outcomes);
    let len = gallery.len();
    drop(gallery);

    log::info!(
        "[enhance_all] done: {} ok, {} failed, {} discarded",
        report.succeeded,
        report.failed,
        report.discarded
    );
    state.events.emit(AppEvent::StateChanged(StateChangedPayload {
        state: BatchState::Idle,
    }));
    state
        .events
        .emit(AppEvent::GalleryChanged(GalleryChangedPayload { len }));
    Ok(report)
}

/// Saves the enhanced bytes of one entry. Returns `None` when there is nothing to save.
pub async fn download_enhanced(state: &AppState, index: usize) -> AppResult<Option<PathBuf>> {
    let bytes = state.gallery.read().await.enhanced_bytes(index);
    let Some(bytes) = bytes else {
        return Ok(None);
    };

    let dir = state.config.download_dir();
    let path = save_to(&dir, index, &bytes).await?;
    log::info!("[download_enhanced] wrote {}", path.display());
    Ok(Some(path))
}

async fn save_to(dir: &Path, index: usize, bytes: &[u8]) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(download_filename(index));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::AppError;
    use crate::gallery::batch::Enhancer;
    use async_trait::async_trait;
    use bytes::Bytes;

    /// Fails every file whose name contains "fail".
    struct MixedEnhancer;

    #[async_trait]
    impl Enhancer for MixedEnhancer {
        async fn enhance(&self, file: &ImageFile) -> AppResult<Bytes> {
            if file.name.contains("fail") {
                Err(AppError::Proxy {
                    status: 500,
                    message: "{\"error\":\"Error enhancing image\"}".into(),
                })
            } else {
                Ok(Bytes::from(format!("enhanced:{}", file.name)))
            }
        }
    }

    fn state_in(dir: &Path) -> AppState {
        let config = AppConfig {
            download_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        };
        AppState::new(config, Arc::new(MixedEnhancer))
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, Some("image/png".into()), b"raw".to_vec())
    }

    #[test]
    fn filenames_are_one_based() {
        assert_eq!(download_filename(0), "enhanced_image_1.png");
        assert_eq!(download_filename(9), "enhanced_image_10.png");
    }

    #[tokio::test]
    async fn enhance_all_commits_mixed_results() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let mut events = state.events.subscribe();

        add_images(&state, vec![png("a.png"), png("fail.png"), png("c.png")])
            .await
            .unwrap();
        let report = enhance_all(&state).await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);

        let gallery = get_gallery(&state).await.unwrap();
        assert_eq!(gallery.images.len(), 3);
        assert!(gallery.images[0].enhanced.is_some());
        assert!(gallery.images[1].enhanced.is_none());
        assert!(gallery.images[2].enhanced.is_some());
        assert!(!gallery.enhancing);
        assert_eq!(gallery.progress, 100.0);

        let mut last_progress = None;
        while let Ok(event) = events.try_recv() {
            if let AppEvent::Progress(p) = event {
                last_progress = Some(p);
            }
        }
        let last = last_progress.unwrap();
        assert_eq!((last.completed, last.total), (3, 3));
        assert_eq!(last.percent, 100.0);
    }

    #[tokio::test]
    async fn all_failures_still_return_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        add_images(&state, vec![png("fail1.png"), png("fail2.png")])
            .await
            .unwrap();

        let report = enhance_all(&state).await.unwrap();

        assert_eq!(report.failed, 2);
        let gallery = get_gallery(&state).await.unwrap();
        assert!(!gallery.enhancing);
        assert_eq!(gallery.progress, 100.0);
        assert!(gallery.images.iter().all(|i| i.enhanced.is_none()));
    }

    #[tokio::test]
    async fn enhance_all_on_empty_gallery_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        assert!(matches!(
            enhance_all(&state).await,
            Err(AppError::NothingToEnhance)
        ));
    }

    #[tokio::test]
    async fn download_writes_numbered_png() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        add_images(&state, vec![png("fail.png"), png("b.png")])
            .await
            .unwrap();
        enhance_all(&state).await.unwrap();

        assert!(download_enhanced(&state, 0).await.unwrap().is_none());
        assert!(download_enhanced(&state, 7).await.unwrap().is_none());

        let path = download_enhanced(&state, 1).await.unwrap().unwrap();
        assert_eq!(path, dir.path().join("enhanced_image_2.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"enhanced:b.png");
    }

    #[tokio::test]
    async fn remove_image_out_of_range_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        add_images(&state, vec![png("a.png"), png("b.png")])
            .await
            .unwrap();

        remove_image(&state, 4).await.unwrap();
        remove_image(&state, 0).await.unwrap();

        let gallery = get_gallery(&state).await.unwrap();
        assert_eq!(gallery.images.len(), 1);
        assert_eq!(gallery.images[0].name, "b.png");
    }
}
