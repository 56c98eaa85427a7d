use serde::Serialize;

pub const ENHANCE_PROGRESS: &str = "enhance:progress";
pub const ENHANCE_STATE_CHANGED: &str = "enhance:state-changed";
pub const GALLERY_CHANGED: &str = "gallery:changed";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressPayload {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StateChangedPayload {
    pub state: BatchState,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    Idle,
    Enhancing,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GalleryChangedPayload {
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Progress(ProgressPayload),
    StateChanged(StateChangedPayload),
    GalleryChanged(GalleryChangedPayload),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Progress(_) => ENHANCE_PROGRESS,
            AppEvent::StateChanged(_) => ENHANCE_STATE_CHANGED,
            AppEvent::GalleryChanged(_) => GALLERY_CHANGED,
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            AppEvent::Progress(p) => serde_json::to_value(p),
            AppEvent::StateChanged(p) => serde_json::to_value(p),
            AppEvent::GalleryChanged(p) => serde_json::to_value(p),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Fan-out of UI events. Emitting with nobody listening is fine.
#[derive(Clone)]
pub struct EventBus {
    tx: tokio::sync::broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        log::debug!("[event] {} {}", event.name(), event.payload());
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
