use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use super::batch::EnhanceOutcome;
use super::image::{is_accepted, ImageFile, ImageSummary, UploadedImage};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryState {
    pub images: Vec<ImageSummary>,
    pub enhancing: bool,
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Results whose image was removed while the call was in flight.
    pub discarded: usize,
}

/// Ordered list of dropped images plus the enhance button state.
pub struct ImageGallery {
    images: Vec<UploadedImage>,
    enhancing: bool,
    progress: f64,
}

impl ImageGallery {
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            enhancing: false,
            progress: 0.0,
        }
    }

    /// Appends every accepted file in arrival order and returns how many were added.
    pub fn add_images(&mut self, files: Vec<ImageFile>) -> usize {
        let mut added = 0;
        for file in files {
            if !is_accepted(&file) {
                log::warn!(
                    "Rejected {} ({})",
                    file.name,
                    file.mime.as_deref().unwrap_or("unknown type")
                );
                continue;
            }
            self.images.push(UploadedImage::new(file));
            added += 1;
        }
        added
    }

    pub fn remove_image(&mut self, index: usize) -> Option<UploadedImage> {
        if index >= self.images.len() {
            return None;
        }
        Some(self.images.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&UploadedImage> {
        self.images.get(index)
    }

    pub fn enhanced_bytes(&self, index: usize) -> Option<Bytes> {
        self.images.get(index).and_then(|i| i.enhanced_bytes.clone())
    }

    pub fn can_enhance(&self) -> bool {
        !self.enhancing && !self.images.is_empty()
    }

    /// Switches to the enhancing state and hands back what to send.
    pub fn begin_batch(&mut self) -> AppResult<Vec<(Uuid, ImageFile)>> {
        if self.enhancing {
            return Err(AppError::EnhanceInProgress);
        }
        if self.images.is_empty() {
            return Err(AppError::NothingToEnhance);
        }

        self.enhancing = true;
        self.progress = 0.0;
        Ok(self
            .images
            .iter()
            .map(|i| (i.id, i.file.clone()))
            .collect())
    }

    pub fn set_progress(&mut self, percent: f64) {
        self.progress = percent.clamp(0.0, 100.0);
    }

    /// Applies every settled call at once and returns to idle.
    pub fn commit_batch(&mut self, outcomes: Vec<EnhanceOutcome>) -> BatchReport {
        let mut report = BatchReport {
            total: outcomes.len(),
            ..BatchReport::default()
        };

        for outcome in outcomes {
            let Some(image) = self.images.iter_mut().find(|i| i.id == outcome.id) else {
                report.discarded += 1;
                continue;
            };
            match outcome.result {
                Ok(bytes) => {
                    image.set_enhanced(bytes);
                    report.succeeded += 1;
                }
                Err(_) => report.failed += 1,
            }
        }

        self.enhancing = false;
        report
    }

    pub fn state(&self) -> GalleryState {
        GalleryState {
            images: self.images.iter().map(UploadedImage::summary).collect(),
            enhancing: self.enhancing,
            progress: self.progress,
        }
    }

    pub fn is_enhancing(&self) -> bool {
        self.enhancing
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Default for ImageGallery {
    fn default() -> Self {
        Self::new()
    }
}
