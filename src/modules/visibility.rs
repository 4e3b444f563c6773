use serde::{Deserialize, Serialize};

/// default space reserved at the top of the viewport for the sticky headers
pub const DEFAULT_HEADER_OFFSET: f64 = 140.0;

/// on-screen vertical bounds of the viewer's leaderboard row
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub struct RowBounds {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub struct Viewport {
    pub height: f64,
    pub header_offset: f64,
}

impl Viewport {
    pub fn new(height: f64) -> Viewport {
        Viewport {
            height,
            header_offset: DEFAULT_HEADER_OFFSET,
        }
    }
}

/// # docking
/// where the viewer's row is relative to what is on screen.
/// `AboveViewport` docks the rank banner at the top, `BelowViewport` at the bottom.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Docking {
    AboveViewport,
    BelowViewport,
    Visible,
}

impl Docking {
    pub fn shows_banner(&self) -> bool {
        *self != Docking::Visible
    }
}

/// # docking of a row
/// a row hidden under the header counts as above the viewport.
pub fn docking(row: RowBounds, viewport: Viewport) -> Docking {
    if row.bottom < viewport.header_offset {
        Docking::AboveViewport
    } else if row.top > viewport.height {
        Docking::BelowViewport
    } else {
        Docking::Visible
    }
}

/// # visibility tracker
/// keeps the docking state between scroll and resize events.
/// the presentation layer feeds it geometry, it only answers.
#[derive(Debug, Default, Clone)]
pub struct VisibilityTracker {
    state: Option<Docking>,
}

impl VisibilityTracker {
    pub fn new() -> VisibilityTracker {
        VisibilityTracker::default()
    }

    pub fn state(&self) -> Option<Docking> {
        self.state
    }

    /// # recompute
    /// called on every scroll or resize.
    ///
    /// ## Arguments
    /// * `row` - bounds of the viewer's row, `None` when there is no ranked row
    /// * `viewport` - current viewport
    /// * `suppressed` - true while the drill-down view is open
    ///
    /// ## Returns
    /// * `Option<Docking>` - the new state, `None` when nothing should be tracked
    pub fn recompute(&mut self, row: Option<RowBounds>, viewport: Viewport, suppressed: bool) -> Option<Docking> {
        self.state = match row {
            Some(row) if !suppressed => Some(docking(row, viewport)),
            _ => None,
        };
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}
