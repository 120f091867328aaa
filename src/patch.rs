//! Patch entity: one damage event moving through decay and restore.

/// Axis-aligned rectangle in image pixel coordinates.
///
/// Drawn once at spawn and never resized. Spawned rects always fit the buffer
/// they were drawn for, but clipping happens lazily at mutation time so a
/// rect is valid against any buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Half-open pixel ranges of a rect intersected with buffer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedRect {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl PatchRect {
    /// Intersect with a `width` x `height` buffer; `None` when fully outside.
    #[must_use]
    pub fn clipped(&self, width: u32, height: u32) -> Option<ClippedRect> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(ClippedRect {
            x0: x0 as u32,
            x1: x1 as u32,
            y0: y0 as u32,
            y1: y1 as u32,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPhase {
    Decaying,
    Restoring,
}

/// One active damage event. Owned exclusively by the scheduler.
#[derive(Debug, Clone)]
pub struct Patch {
    pub rect: PatchRect,
    /// Elapsed ticks within the current phase.
    pub t: u32,
    pub phase: PatchPhase,
}

impl Patch {
    #[must_use]
    pub const fn new(rect: PatchRect) -> Self {
        Self {
            rect,
            t: 0,
            phase: PatchPhase::Decaying,
        }
    }
}
