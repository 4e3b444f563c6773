use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::errors::CustomResult;
use crate::modules::catalog::Catalog;
use crate::modules::drill_down::{history, History};
use crate::modules::models::competitor::Identity;
use crate::modules::models::lap_record::LapRecord;
use crate::modules::ranking::{rank, ClassFilter, Leaderboard};
use crate::modules::visibility::{Docking, RowBounds, Viewport, VisibilityTracker};

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct RequestTicket {
    generation: u64,
}

/// # latest request
/// hands out tickets for reads. only the newest ticket may apply its result.
#[derive(Debug, Default)]
pub struct LatestRequest {
    generation: AtomicU64,
}

impl LatestRequest {
    pub fn new() -> LatestRequest {
        LatestRequest::default()
    }

    pub fn issue(&self) -> RequestTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket { generation }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }
}

/// # leaderboard view
/// the state a leaderboard screen keeps between reads: which track and
/// class are shown, whether a competitor is drilled into, and the last
/// record snapshot. every board is computed fresh from the snapshot.
#[derive(Debug)]
pub struct LeaderboardView {
    catalog: Catalog,
    viewer: Option<Identity>,
    track_id: String,
    class_filter: ClassFilter,
    selected: Option<String>,
    snapshot: Vec<LapRecord>,
    requests: LatestRequest,
    tracker: VisibilityTracker,
    last_error: Option<String>,
}

impl LeaderboardView {
    pub fn new(catalog: Catalog, viewer: Option<Identity>, track_id: &str) -> LeaderboardView {
        LeaderboardView {
            catalog,
            viewer,
            track_id: track_id.to_string(),
            class_filter: ClassFilter::All,
            selected: None,
            snapshot: Vec::new(),
            requests: LatestRequest::new(),
            tracker: VisibilityTracker::new(),
            last_error: None,
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn class_filter(&self) -> ClassFilter {
        self.class_filter
    }

    pub fn selected_driver(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn snapshot(&self) -> &[LapRecord] {
        &self.snapshot
    }

    /// message of the last failed read, cleared by the next successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_class_filter(&mut self, class_filter: ClassFilter) {
        self.class_filter = class_filter;
    }

    /// # begin a read
    /// switching to another track leaves the drill-down view and drops the
    /// previous track's rows.
    ///
    /// ## Returns
    /// * `RequestTicket` - hand it back to `finish_load` with the result
    pub fn begin_load(&mut self, track_id: &str) -> RequestTicket {
        if self.track_id != track_id {
            debug!(target: "modules/view:begin_load", "switching from {} to {}", self.track_id, track_id);
            self.track_id = track_id.to_string();
            self.selected = None;
            self.snapshot.clear();
            self.tracker.reset();
        }
        self.requests.issue()
    }

    /// # finish a read
    /// results of superseded reads are dropped. a failed read keeps the
    /// last snapshot so the board stays usable.
    ///
    /// ## Returns
    /// * `bool` - whether the result was applied
    pub fn finish_load(&mut self, ticket: RequestTicket, result: CustomResult<Vec<LapRecord>>) -> bool {
        if !self.requests.is_current(ticket) {
            debug!(target: "modules/view:finish_load", "dropping superseded read for {}", self.track_id);
            return false;
        }

        match result {
            Ok(records) => {
                self.snapshot = records.into_iter().filter(|r| r.track_id == self.track_id).collect();
                self.last_error = None;
            }
            Err(error) => {
                warn!(target: "modules/view:finish_load", "Error loading {}, keeping the last snapshot: {}", self.track_id, error);
                self.last_error = Some(error.to_string());
            }
        }
        true
    }

    pub fn select_driver(&mut self, owner: &str) {
        self.selected = Some(owner.to_string());
        self.tracker.reset();
    }

    pub fn back(&mut self) {
        self.selected = None;
    }

    /// # after a delete
    /// leave the drill-down view when the deleted lap was the competitor's
    /// last one on this track. the snapshot itself is only replaced by the
    /// read started here.
    pub fn after_delete(&mut self, removed: &LapRecord) -> RequestTicket {
        if self.selected.as_deref() == Some(removed.owner.as_str()) {
            let remaining = self
                .snapshot
                .iter()
                .any(|r| r.id != removed.id && r.owner == removed.owner && r.track_id == self.track_id);
            if !remaining {
                debug!(target: "modules/view:after_delete", "{} has no laps left on {}", removed.owner, self.track_id);
                self.selected = None;
            }
        }
        self.requests.issue()
    }

    pub fn leaderboard(&self) -> Leaderboard {
        rank(&self.snapshot, self.class_filter, &self.catalog, self.viewer.as_ref())
    }

    /// the drill-down history, `None` when no competitor is selected
    pub fn history(&self) -> Option<History> {
        self.selected
            .as_deref()
            .map(|owner| history(&self.snapshot, owner, &self.track_id, &self.catalog))
    }

    /// # docking of the viewer's row
    /// nothing is tracked in the drill-down view or without a ranked row
    pub fn docking(&mut self, row: Option<RowBounds>, viewport: Viewport) -> Option<Docking> {
        let suppressed = self.selected.is_some() || self.leaderboard().viewer_entry().is_none();
        self.tracker.recompute(row, viewport, suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::modules::models::lap_record::tests::lap;
    use crate::modules::store::StoreError;

    fn view() -> LeaderboardView {
        LeaderboardView::new(Catalog::default(), Some(Identity::new("alice", None)), "monza")
    }

    fn monza() -> Vec<LapRecord> {
        vec![
            lap("bob", "monza", "bmw_m4_gt3", 105_998),
            lap("alice", "monza", "bmw_m4_gt3", 106_320),
            lap("alice", "monza", "bmw_m4_gt4", 118_000),
        ]
    }

    #[test]
    fn latest_request_wins() {
        let mut view = view();
        let first = view.begin_load("spa");
        let second = view.begin_load("monza");

        assert!(view.finish_load(second, Ok(monza())));
        assert!(!view.finish_load(first, Ok(vec![lap("carol", "spa", "bmw_m4_gt3", 138_000)])));
        assert_eq!(view.track_id(), "monza");
        assert_eq!(view.leaderboard().len(), 2);
    }

    #[test]
    fn switching_track_leaves_drill_down() {
        let mut view = view();
        let ticket = view.begin_load("monza");
        view.finish_load(ticket, Ok(monza()));
        view.select_driver("alice");
        assert_eq!(view.history().map(|h| h.entries.len()), Some(2));

        view.begin_load("monza");
        assert_eq!(view.selected_driver(), Some("alice"));
        view.begin_load("spa");
        assert_eq!(view.selected_driver(), None);
        assert!(view.history().is_none());
    }

    #[test]
    fn switching_track_drops_the_old_rows() {
        let mut view = view();
        let ticket = view.begin_load("monza");
        view.finish_load(ticket, Ok(monza()));
        assert_eq!(view.leaderboard().len(), 2);

        let viewport = Viewport::new(800.0);
        let below = Some(RowBounds { top: 1200.0, bottom: 1248.0 });
        view.begin_load("spa");

        assert!(view.snapshot().is_empty());
        assert!(view.leaderboard().is_empty());
        assert_eq!(view.docking(below, viewport), None);
    }

    #[test]
    fn deleting_the_last_lap_leaves_drill_down() {
        let records = vec![lap("bob", "monza", "bmw_m4_gt3", 105_998), lap("alice", "monza", "bmw_m4_gt3", 106_320)];
        let mut view = view();
        let ticket = view.begin_load("monza");
        view.finish_load(ticket, Ok(records.clone()));
        view.select_driver("alice");

        let reload = view.after_delete(&records[1]);
        assert_eq!(view.selected_driver(), None);
        assert!(view.finish_load(reload, Ok(vec![records[0].clone()])));
        assert_eq!(view.leaderboard().len(), 1);
    }

    #[test]
    fn deleting_one_of_several_laps_stays_in_drill_down() {
        let records = monza();
        let mut view = view();
        let ticket = view.begin_load("monza");
        view.finish_load(ticket, Ok(records.clone()));
        view.select_driver("alice");

        view.after_delete(&records[2]);
        assert_eq!(view.selected_driver(), Some("alice"));
    }

    #[test]
    fn failed_read_keeps_the_snapshot() {
        let mut view = view();
        let ticket = view.begin_load("monza");
        view.finish_load(ticket, Ok(monza()));

        let ticket = view.begin_load("monza");
        let failure = Err(Error::StorageError { source: StoreError::Connection { message: "timeout".to_string() } });
        assert!(view.finish_load(ticket, failure));

        assert_eq!(view.leaderboard().len(), 2);
        assert!(view.last_error().unwrap_or_default().contains("timeout"));
    }

    #[test]
    fn docking_is_suppressed_in_drill_down_and_without_a_row() {
        let viewport = Viewport::new(800.0);
        let below = Some(RowBounds { top: 1200.0, bottom: 1248.0 });

        let mut view = view();
        let ticket = view.begin_load("monza");
        view.finish_load(ticket, Ok(monza()));
        assert_eq!(view.docking(below, viewport), Some(Docking::BelowViewport));

        view.select_driver("bob");
        assert_eq!(view.docking(below, viewport), None);
        view.back();

        view.set_class_filter("CUP".parse().unwrap());
        assert_eq!(view.docking(below, viewport), None);

        let mut anonymous = LeaderboardView::new(Catalog::default(), None, "monza");
        let ticket = anonymous.begin_load("monza");
        anonymous.finish_load(ticket, Ok(monza()));
        assert_eq!(anonymous.docking(below, viewport), None);
    }
}
