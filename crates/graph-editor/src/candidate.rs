//! Candidate placement: stage a node, then click to commit or cancel
//!
//! At most one candidate is staged at a time. While staged, the pointer is
//! tracked in page and canvas coordinates so the renderer can draw a ghost
//! node; tracking never touches the committed graph.

use serde::{Deserialize, Serialize};

use crate::payload::NodeData;
use crate::types::Position;

/// Converts page (screen) coordinates to canvas coordinates
///
/// Supplied by the render host, which owns pan and zoom.
pub trait ScreenToCanvas {
    fn screen_to_canvas(&self, point: Position) -> Position;
}

impl<F> ScreenToCanvas for F
where
    F: Fn(Position) -> Position,
{
    fn screen_to_canvas(&self, point: Position) -> Position {
        self(point)
    }
}

/// Pan/zoom state of a canvas viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Page position of the canvas origin
    pub offset: Position,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Position::ORIGIN,
            zoom: 1.0,
        }
    }
}

impl ScreenToCanvas for Viewport {
    fn screen_to_canvas(&self, point: Position) -> Position {
        let local = point - self.offset;
        if self.zoom > 0.0 {
            local / self.zoom
        } else {
            local
        }
    }
}

/// A staged, not-yet-committed node
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub data: NodeData,
    /// Last pointer position in page coordinates
    pub page_position: Option<Position>,
    /// Last pointer position in canvas-local coordinates
    pub canvas_position: Option<Position>,
}

/// The single candidate slot
#[derive(Debug, Default)]
pub struct CandidatePlacement {
    staged: Option<Candidate>,
}

impl CandidatePlacement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a node description, discarding any previous candidate
    ///
    /// Returns true if a previous candidate was replaced.
    pub fn stage(&mut self, data: NodeData) -> bool {
        self.staged
            .replace(Candidate {
                data,
                page_position: None,
                canvas_position: None,
            })
            .is_some()
    }

    /// Record the pointer position; no-op without a candidate
    pub fn track(&mut self, page: Position, canvas: Position) -> bool {
        match self.staged.as_mut() {
            Some(candidate) => {
                candidate.page_position = Some(page);
                candidate.canvas_position = Some(canvas);
                true
            }
            None => false,
        }
    }

    /// Drop the candidate; returns whether one was staged
    pub fn cancel(&mut self) -> bool {
        self.staged.take().is_some()
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.staged.as_ref()
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Take the candidate out for insertion
    ///
    /// The last page position is run through `transform` to find the canvas
    /// position. Without a candidate or a known pointer position nothing is
    /// taken and the slot is left as it was.
    pub fn take_for_commit(&mut self, transform: &dyn ScreenToCanvas) -> Option<(NodeData, Position)> {
        let page = self.staged.as_ref()?.page_position?;
        let candidate = self.staged.take()?;
        Some((candidate.data, transform.screen_to_canvas(page)))
    }
}
