//! The job view: a region selector paired with the session that consumes it.
//!
//! The selector is cleared only once a new job is actually open, so a failed
//! upload or fetch leaves the drawn rectangles in place.

use crate::selection::{DisplayGeometry, Overlay, RegionSelector};
use crate::service::{JobId, VideoUpload};
use crate::session::{JobOrchestrator, Notice, SessionError, SessionEvents, SessionProgress};
use std::sync::{Arc, Mutex, PoisonError};

pub struct Editor {
    orchestrator: JobOrchestrator,
    selector: Mutex<RegionSelector>,
    events: Arc<dyn SessionEvents>,
}

impl Editor {
    pub fn new(orchestrator: JobOrchestrator, events: Arc<dyn SessionEvents>) -> Self {
        Self {
            orchestrator,
            selector: Mutex::new(RegionSelector::new()),
            events,
        }
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    fn with_selector<T>(&self, apply: impl FnOnce(&mut RegionSelector) -> T) -> (T, Overlay) {
        let mut selector = self.selector.lock().unwrap_or_else(PoisonError::into_inner);
        let before = selector.revision();
        let result = apply(&mut selector);
        let overlay = selector.overlay();
        drop(selector);

        if overlay.revision != before {
            self.events.redraw(&overlay);
        }
        (result, overlay)
    }

    pub fn overlay(&self) -> Overlay {
        self.with_selector(|_| ()).1
    }

    pub fn toggle_selection(&self) -> Overlay {
        let (changed, overlay) = self.with_selector(RegionSelector::toggle_selecting);
        if changed && overlay.selecting {
            self.events
                .notice(Notice::info("Click and drag to select watermarks in the video"));
        }
        overlay
    }

    pub fn pointer_down(&self, x: f64, y: f64) -> Overlay {
        self.with_selector(|selector| selector.pointer_down(x, y)).1
    }

    pub fn pointer_move(&self, x: f64, y: f64) -> Overlay {
        self.with_selector(|selector| selector.pointer_move(x, y)).1
    }

    pub fn pointer_up(&self, playback_secs: f64) -> Overlay {
        let (committed, overlay) = self.with_selector(|selector| selector.pointer_up(playback_secs));
        if let Some(rect) = committed {
            tracing::debug!("Committed selection {} at {:.2}s", rect.id, rect.timestamp);
        }
        overlay
    }

    pub fn remove(&self, id: &str) -> Overlay {
        self.with_selector(|selector| selector.remove(id)).1
    }

    pub fn set_geometry(&self, geometry: DisplayGeometry) -> Overlay {
        self.with_selector(|selector| selector.set_geometry(geometry)).1
    }

    pub async fn upload(&self, video: &VideoUpload) -> Result<SessionProgress, SessionError> {
        let snapshot = self.orchestrator.upload(video).await?;
        self.reset();
        Ok(snapshot)
    }

    pub async fn open(&self, job_id: JobId) -> Result<SessionProgress, SessionError> {
        let snapshot = self.orchestrator.open(job_id).await?;
        self.reset();
        Ok(snapshot)
    }

    /// Save the drawn rectangles, rescaled to native pixels, and move to review
    pub async fn proceed(&self) -> Result<SessionProgress, SessionError> {
        let selections = {
            let selector = self.selector.lock().unwrap_or_else(PoisonError::into_inner);
            selector.native_selections()
        };
        self.orchestrator.proceed(selections).await
    }

    pub async fn close(&self) {
        self.orchestrator.close().await;
        self.reset();
    }

    fn reset(&self) {
        self.with_selector(RegionSelector::clear);
    }
}
