use std::collections::{BTreeMap, BTreeSet};

use foundation::ids::EventId;

use crate::event::Event;

/// Delay before an entering marker settles to visible.
pub const ENTER_DWELL_MS: u64 = 120;
/// Delay before an exiting marker is dropped.
pub const EXIT_DWELL_MS: u64 = 420;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerPhase {
    Entering,
    Visible,
    Exiting,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DwellKind {
    Enter,
    Exit,
}

/// Identity of one scheduled dwell. The token changes every time a marker
/// arms a new dwell, so a late firing of an older dwell never matches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DwellTimer {
    pub id: EventId,
    pub kind: DwellKind,
    pub token: u64,
}

/// What the caller must do with its scheduler after a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DwellRequest {
    Schedule { timer: DwellTimer, delay_ms: u64 },
    Cancel(DwellTimer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub event: Event,
    pub phase: MarkerPhase,
    pending: Option<DwellTimer>,
}

impl Marker {
    pub fn pending(&self) -> Option<&DwellTimer> {
        self.pending.as_ref()
    }
}

/// Enter/visible/exit lifecycle of map markers, keyed by event id.
///
/// The manager never touches a clock. [`MarkerLifecycle::reconcile`] commits
/// the new phase map and returns the dwell timers the caller must schedule
/// (relative to that commit) or cancel; the caller reports elapsed dwells
/// back through [`MarkerLifecycle::on_dwell_elapsed`].
///
/// Ordering contract:
/// - [`MarkerLifecycle::entries`] iterates in ascending id order and includes
///   exiting markers until their exit dwell elapses.
#[derive(Debug, Default)]
pub struct MarkerLifecycle {
    markers: BTreeMap<EventId, Marker>,
    next_token: u64,
}

impl MarkerLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<&Marker> {
        self.markers.get(id)
    }

    pub fn phase(&self, id: &EventId) -> Option<MarkerPhase> {
        self.markers.get(id).map(|m| m.phase)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.markers.values()
    }

    pub fn count_in(&self, phase: MarkerPhase) -> usize {
        self.markers.values().filter(|m| m.phase == phase).count()
    }

    /// Diffs `current` against the committed phase map.
    ///
    /// - new id: `Entering`, enter dwell armed.
    /// - id in both: payload refreshed, phase kept. An `Exiting` marker that
    ///   reappears has its exit dwell cancelled and becomes `Visible`.
    /// - id gone: `Exiting` (once), any enter dwell cancelled, exit dwell armed.
    pub fn reconcile<'a>(
        &mut self,
        current: impl IntoIterator<Item = &'a Event>,
    ) -> Vec<DwellRequest> {
        let mut requests = Vec::new();
        let mut present: BTreeSet<EventId> = BTreeSet::new();

        for event in current {
            present.insert(event.id.clone());

            if let Some(marker) = self.markers.get_mut(&event.id) {
                marker.event = event.clone();
                if marker.phase == MarkerPhase::Exiting {
                    if let Some(timer) = marker.pending.take() {
                        requests.push(DwellRequest::Cancel(timer));
                    }
                    marker.phase = MarkerPhase::Visible;
                }
                continue;
            }

            let timer = self.arm(&event.id, DwellKind::Enter);
            requests.push(DwellRequest::Schedule {
                timer: timer.clone(),
                delay_ms: ENTER_DWELL_MS,
            });
            self.markers.insert(
                event.id.clone(),
                Marker {
                    event: event.clone(),
                    phase: MarkerPhase::Entering,
                    pending: Some(timer),
                },
            );
        }

        let leaving: Vec<EventId> = self
            .markers
            .iter()
            .filter(|(id, m)| m.phase != MarkerPhase::Exiting && !present.contains(*id))
            .map(|(id, _)| id.clone())
            .collect();

        for id in leaving {
            let timer = self.arm(&id, DwellKind::Exit);
            let Some(marker) = self.markers.get_mut(&id) else {
                continue;
            };
            if let Some(old) = marker.pending.replace(timer.clone()) {
                requests.push(DwellRequest::Cancel(old));
            }
            marker.phase = MarkerPhase::Exiting;
            requests.push(DwellRequest::Schedule {
                timer,
                delay_ms: EXIT_DWELL_MS,
            });
        }

        requests
    }

    /// Applies an elapsed dwell. Returns `true` if the phase map changed;
    /// stale or unknown timers are ignored.
    pub fn on_dwell_elapsed(&mut self, timer: &DwellTimer) -> bool {
        let Some(marker) = self.markers.get_mut(&timer.id) else {
            return false;
        };
        if marker.pending.as_ref() != Some(timer) {
            return false;
        }
        marker.pending = None;

        match (timer.kind, marker.phase) {
            (DwellKind::Enter, MarkerPhase::Entering) => {
                marker.phase = MarkerPhase::Visible;
                true
            }
            (DwellKind::Exit, MarkerPhase::Exiting) => {
                self.markers.remove(&timer.id);
                true
            }
            _ => false,
        }
    }

    /// Unmount: drops every marker and returns a cancel for each armed dwell.
    pub fn teardown(&mut self) -> Vec<DwellRequest> {
        let markers = std::mem::take(&mut self.markers);
        markers
            .into_values()
            .filter_map(|m| m.pending)
            .map(DwellRequest::Cancel)
            .collect()
    }

    fn arm(&mut self, id: &EventId, kind: DwellKind) -> DwellTimer {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        DwellTimer {
            id: id.clone(),
            kind,
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DwellKind, DwellRequest, DwellTimer, ENTER_DWELL_MS, EXIT_DWELL_MS, MarkerLifecycle,
        MarkerPhase,
    };
    use crate::event::Event;
    use foundation::ids::EventId;
    use pretty_assertions::assert_eq;

    fn ev(id: &str) -> Event {
        Event::new(id)
    }

    fn none() -> &'static [Event] {
        &[]
    }

    fn scheduled(reqs: &[DwellRequest]) -> Vec<(DwellTimer, u64)> {
        reqs.iter()
            .filter_map(|r| match r {
                DwellRequest::Schedule { timer, delay_ms } => Some((timer.clone(), *delay_ms)),
                DwellRequest::Cancel(_) => None,
            })
            .collect()
    }

    fn cancelled(reqs: &[DwellRequest]) -> Vec<DwellTimer> {
        reqs.iter()
            .filter_map(|r| match r {
                DwellRequest::Cancel(t) => Some(t.clone()),
                DwellRequest::Schedule { .. } => None,
            })
            .collect()
    }

    #[test]
    fn new_marker_enters_then_becomes_visible() {
        let mut m = MarkerLifecycle::new();
        let a = EventId::from("a");

        let reqs = m.reconcile(&[ev("a")]);
        assert_eq!(m.phase(&a), Some(MarkerPhase::Entering));

        let s = scheduled(&reqs);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].0.kind, DwellKind::Enter);
        assert_eq!(s[0].1, ENTER_DWELL_MS);

        assert!(m.on_dwell_elapsed(&s[0].0));
        assert_eq!(m.phase(&a), Some(MarkerPhase::Visible));
    }

    #[test]
    fn present_in_both_keeps_phase_and_refreshes_payload() {
        let mut m = MarkerLifecycle::new();
        let a = EventId::from("a");

        m.reconcile(&[ev("a")]);
        let reqs = m.reconcile(&[ev("a").with_magnitude(4.5)]);
        assert!(reqs.is_empty());
        assert_eq!(m.phase(&a), Some(MarkerPhase::Entering));
        assert_eq!(m.get(&a).and_then(|mk| mk.event.magnitude), Some(4.5));
    }

    #[test]
    fn removed_marker_exits_before_deletion() {
        let mut m = MarkerLifecycle::new();
        let a = EventId::from("a");

        let enter = scheduled(&m.reconcile(&[ev("a")]));
        m.on_dwell_elapsed(&enter[0].0);

        let reqs = m.reconcile(none());
        assert_eq!(m.phase(&a), Some(MarkerPhase::Exiting));
        assert_eq!(m.entries().count(), 1);

        let exit = scheduled(&reqs);
        assert_eq!(exit.len(), 1);
        assert_eq!(exit[0].0.kind, DwellKind::Exit);
        assert_eq!(exit[0].1, EXIT_DWELL_MS);

        // A second pass without the id must not re-arm the exit.
        assert!(m.reconcile(none()).is_empty());

        assert!(m.on_dwell_elapsed(&exit[0].0));
        assert_eq!(m.phase(&a), None);
        assert!(m.is_empty());
    }

    #[test]
    fn leaving_while_entering_cancels_enter_dwell() {
        let mut m = MarkerLifecycle::new();
        let a = EventId::from("a");

        let enter = scheduled(&m.reconcile(&[ev("a")]));
        let reqs = m.reconcile(none());
        assert_eq!(cancelled(&reqs), vec![enter[0].0.clone()]);
        assert_eq!(m.phase(&a), Some(MarkerPhase::Exiting));

        // The enter dwell firing anyway must not resurrect the marker.
        assert!(!m.on_dwell_elapsed(&enter[0].0));
        assert_eq!(m.phase(&a), Some(MarkerPhase::Exiting));
    }

    #[test]
    fn reappearing_while_exiting_cancels_removal_without_reentering() {
        let mut m = MarkerLifecycle::new();
        let a = EventId::from("a");

        let enter = scheduled(&m.reconcile(&[ev("a")]));
        m.on_dwell_elapsed(&enter[0].0);
        let exit = scheduled(&m.reconcile(none()));

        let reqs = m.reconcile(&[ev("a")]);
        assert_eq!(cancelled(&reqs), vec![exit[0].0.clone()]);
        assert!(scheduled(&reqs).is_empty());
        assert_eq!(m.phase(&a), Some(MarkerPhase::Visible));

        assert!(!m.on_dwell_elapsed(&exit[0].0));
        assert_eq!(m.phase(&a), Some(MarkerPhase::Visible));

        // Leaving again arms a fresh exit that works normally.
        let exit2 = scheduled(&m.reconcile(none()));
        assert_ne!(exit2[0].0, exit[0].0);
        assert!(m.on_dwell_elapsed(&exit2[0].0));
        assert!(m.is_empty());
    }

    #[test]
    fn mixed_pass_orders_and_counts() {
        let mut m = MarkerLifecycle::new();
        for t in scheduled(&m.reconcile(&[ev("b"), ev("a")])) {
            m.on_dwell_elapsed(&t.0);
        }
        m.reconcile(&[ev("b"), ev("c")]);

        let ids: Vec<&str> = m.entries().map(|mk| mk.event.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(m.count_in(MarkerPhase::Exiting), 1);
        assert_eq!(m.count_in(MarkerPhase::Visible), 1);
        assert_eq!(m.count_in(MarkerPhase::Entering), 1);
    }

    #[test]
    fn teardown_cancels_all_pending_dwells() {
        let mut m = MarkerLifecycle::new();
        m.reconcile(&[ev("a"), ev("b")]);
        let reqs = m.teardown();
        assert_eq!(cancelled(&reqs).len(), 2);
        assert!(m.is_empty());
    }
}
