use super::{normalize, DisplayGeometry, DisplayRect, SelectionSet};
use serde::Serialize;
use uuid::Uuid;

/// Drags must exceed this many display pixels on both axes to commit
pub const MIN_DRAG_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: (f64, f64),
    end: (f64, f64),
}

impl Drag {
    fn bounds(&self) -> (f64, f64, f64, f64) {
        let (sx, sy) = self.start;
        let (ex, ey) = self.end;
        (sx.min(ex), sy.min(ey), (ex - sx).abs(), (ey - sy).abs())
    }
}

/// What the overlay canvas should show after a mutation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub revision: u64,
    pub selecting: bool,
    pub committed: Vec<DisplayRect>,
    pub candidate: Option<CandidateRect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Captures rectangles drawn over the rendered video surface.
///
/// Mutating calls return `true` when the overlay must be redrawn.
#[derive(Debug, Default)]
pub struct RegionSelector {
    selecting: bool,
    candidate: Option<Drag>,
    committed: Vec<DisplayRect>,
    geometry: DisplayGeometry,
    revision: u64,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn set_selecting(&mut self, selecting: bool) -> bool {
        if self.selecting == selecting {
            return false;
        }
        self.selecting = selecting;
        if !selecting {
            self.candidate = None;
        }
        self.touch()
    }

    pub fn toggle_selecting(&mut self) -> bool {
        let next = !self.selecting;
        self.set_selecting(next)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        if !self.selecting {
            return false;
        }
        self.candidate = Some(Drag {
            start: (x, y),
            end: (x, y),
        });
        self.touch()
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if !self.selecting {
            return false;
        }
        match self.candidate.as_mut() {
            Some(drag) => {
                drag.end = (x, y);
                self.touch()
            }
            None => false,
        }
    }

    /// Finish the drag; returns the committed rectangle when it was large enough.
    ///
    /// Selection mode ends either way.
    pub fn pointer_up(&mut self, playback_secs: f64) -> Option<DisplayRect> {
        if !self.selecting {
            return None;
        }
        let drag = self.candidate.take()?;
        self.selecting = false;
        self.touch();

        let (x, y, width, height) = drag.bounds();
        if width <= MIN_DRAG_PX || height <= MIN_DRAG_PX {
            tracing::debug!("Discarded selection {:.0}x{:.0}px below threshold", width, height);
            return None;
        }

        let rect = DisplayRect {
            id: Uuid::new_v4().to_string(),
            x,
            y,
            width,
            height,
            timestamp: if playback_secs.is_finite() { playback_secs.max(0.0) } else { 0.0 },
        };
        self.committed.push(rect.clone());
        Some(rect)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.committed.len();
        self.committed.retain(|rect| rect.id != id);
        if self.committed.len() == before {
            return false;
        }
        self.touch()
    }

    pub fn clear(&mut self) -> bool {
        let had_state = self.selecting || !self.committed.is_empty() || self.candidate.is_some();
        self.committed.clear();
        self.candidate = None;
        self.selecting = false;
        had_state && self.touch()
    }

    /// Record the current rendered and source sizes (resize, new source).
    pub fn set_geometry(&mut self, geometry: DisplayGeometry) -> bool {
        if self.geometry == geometry {
            return false;
        }
        self.geometry = geometry;
        self.touch()
    }

    pub fn committed(&self) -> &[DisplayRect] {
        &self.committed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Committed rectangles rescaled with the latest geometry
    pub fn native_selections(&self) -> SelectionSet {
        normalize::to_native_set(&self.committed, &self.geometry)
    }

    pub fn overlay(&self) -> Overlay {
        Overlay {
            revision: self.revision,
            selecting: self.selecting,
            committed: self.committed.clone(),
            candidate: self.candidate.map(|drag| {
                let (x, y, width, height) = drag.bounds();
                CandidateRect { x, y, width, height }
            }),
        }
    }

    fn touch(&mut self) -> bool {
        self.revision = self.revision.wrapping_add(1);
        true
    }
}
