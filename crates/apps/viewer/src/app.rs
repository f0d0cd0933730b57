//! Viewer state: the feed snapshot plus every interactive state machine,
//! driven by one scheduler on the wall-clock timebase.

use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::bounds::LonLat;
use foundation::ids::EventId;
use foundation::time::{Time, TimeSpan};
use layers::query::{FilterState, filter_events, time_range};
use runtime::metrics::Metrics;
use runtime::playback::{PlaybackConfig, PlaybackTick, TimelinePlayer};
use runtime::scheduler::Scheduler;
use runtime::timer_queue::TimerId;
use scene::event::{Event, EventCollection};
use scene::markers::{DwellRequest, DwellTimer, MarkerLifecycle};
use scene::selection::{FlyTo, Popup, Selection, SelectionChange};
use scene::viewport::Viewport;
use streaming::error::FeedError;
use tracing::{debug, info, warn};

use crate::commands::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerTask {
    Tick(PlaybackTick),
    Dwell(DwellTimer),
    /// Camera move of selection sequence `n` finished.
    FlyToArrived(u64),
}

impl From<PlaybackTick> for ViewerTask {
    fn from(t: PlaybackTick) -> Self {
        ViewerTask::Tick(t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    Loading,
    Ready { fetched_at: Time },
    Failed(FeedError),
}

struct PendingFly {
    sequence: u64,
    timer: TimerId,
    popup: Popup,
}

pub struct ViewerState {
    events: Arc<EventCollection>,
    status: FeedStatus,
    /// Set once a snapshot has been installed; failures never set it.
    loaded: bool,
    filters_open: bool,
    filter: FilterState,
    markers: MarkerLifecycle,
    dwell_timers: BTreeMap<DwellTimer, TimerId>,
    player: TimelinePlayer,
    selection: Selection,
    fly: Option<PendingFly>,
    popup: Option<Popup>,
    viewport: Viewport,
    sched: Scheduler<ViewerTask>,
    metrics: Metrics,
}

impl ViewerState {
    pub fn new(filter: FilterState, playback: PlaybackConfig, now: Time) -> Self {
        let player = TimelinePlayer::new(TimeSpan::instant(now), now, playback);
        Self {
            events: Arc::new(EventCollection::default()),
            status: FeedStatus::Loading,
            loaded: false,
            filters_open: false,
            filter: FilterState {
                timeline_cursor: player.cursor(),
                ..filter
            },
            markers: MarkerLifecycle::new(),
            dwell_timers: BTreeMap::new(),
            player,
            selection: Selection::new(),
            fly: None,
            popup: None,
            viewport: Viewport::default(),
            sched: Scheduler::new(now),
            metrics: Metrics::new(),
        }
    }

    pub fn events(&self) -> &EventCollection {
        &self.events
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn markers(&self) -> &MarkerLifecycle {
        &self.markers
    }

    pub fn player(&self) -> &TimelinePlayer {
        &self.player
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn filters_open(&self) -> bool {
        self.filters_open
    }

    /// Popup of the selected event once its camera move has landed and while
    /// the event is still shown.
    pub fn popup(&self) -> Option<&Popup> {
        let shown = self.shown();
        self.selection.resolve(&shown)?;
        self.popup.as_ref()
    }

    pub fn shown(&self) -> Vec<&Event> {
        filter_events(&self.events.events, &self.filter)
    }

    pub fn next_deadline(&self) -> Option<Time> {
        self.sched.next_deadline()
    }

    #[cfg(test)]
    pub fn pending_tasks(&self) -> usize {
        self.sched.pending()
    }

    /// Installs a fetched snapshot. The timeline range is recomputed from it.
    /// A cursor that sat at the old range end follows the new end; the first
    /// snapshot also centers the map.
    pub fn load(&mut self, events: Arc<EventCollection>, now: Time) {
        let first = !self.loaded;
        let live = self.player.cursor() == self.player.range().end;
        self.sched.settle(now);
        self.player.set_range(time_range(&events.events, now));
        if first || live {
            self.player.fast_forward();
        }
        self.loaded = true;
        self.filter.timeline_cursor = self.player.cursor();
        self.events = events;
        self.status = FeedStatus::Ready { fetched_at: now };
        if first {
            self.viewport = Viewport::initial(&self.shown());
        }
        info!(
            "loaded {} events, {} shown",
            self.events.len(),
            self.shown().len()
        );
        self.refresh();
    }

    /// A failed fetch keeps whatever snapshot is already loaded.
    pub fn fail(&mut self, err: FeedError) {
        warn!("feed unavailable: {err}");
        self.status = FeedStatus::Failed(err);
    }

    pub fn set_magnitude_range(&mut self, min: f64, max: f64) {
        self.filter.min_magnitude = min;
        self.filter.max_magnitude = max;
        if self.filter.is_inverted() {
            warn!("min magnitude {min} is above max {max}; nothing will match");
        }
        self.refresh();
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.filter.place_query = query.into();
        self.refresh();
    }

    pub fn scrub(&mut self, t: Time) {
        self.filter.timeline_cursor = self.player.scrub(t);
        self.refresh();
    }

    pub fn rewind(&mut self) {
        self.filter.timeline_cursor = self.player.rewind();
        self.refresh();
    }

    pub fn fast_forward(&mut self) {
        self.filter.timeline_cursor = self.player.fast_forward();
        self.refresh();
    }

    pub fn play(&mut self) {
        self.player.play(&mut self.sched);
    }

    pub fn pause(&mut self) {
        self.player.pause(&mut self.sched);
    }

    pub fn toggle_play(&mut self) {
        self.player.toggle(&mut self.sched);
    }

    pub fn set_speed(&mut self, speed_ms: u64) {
        self.player.set_speed(speed_ms, &mut self.sched);
    }

    pub fn set_step(&mut self, step_ms: u64) {
        self.player.set_step(step_ms, &mut self.sched);
    }

    pub fn toggle_filters(&mut self) {
        self.filters_open = !self.filters_open;
    }

    pub fn pan(&mut self, center: LonLat) {
        self.viewport.pan_to(center);
    }

    pub fn zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    /// Flies to a shown event and collapses the filter panel. Returns `None`
    /// when the id is not shown.
    pub fn select(&mut self, id: &EventId) -> Option<SelectionChange> {
        let event = self.shown().into_iter().find(|e| &e.id == id)?.clone();
        self.filters_open = false;
        let change = self.selection.select(&event);
        match &change {
            SelectionChange::Started(fly) => self.start_fly(fly),
            SelectionChange::Switched { cancelled, started } => {
                debug!("fly-to {cancelled} cancelled");
                self.start_fly(started);
            }
            SelectionChange::Unchanged | SelectionChange::Cleared { .. } => {}
        }
        Some(change)
    }

    pub fn close_popup(&mut self) -> SelectionChange {
        self.cancel_fly();
        self.popup = None;
        self.selection.close_popup()
    }

    /// Applies an interactive command. Returns `true` when the frame changed.
    /// Commands that need the feed or the terminal are left to the caller.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Toggle => self.toggle_play(),
            Command::Rewind => self.rewind(),
            Command::End => self.fast_forward(),
            Command::Scrub(percent) => {
                let range = self.player.range();
                let offset = range.duration_ms() as f64 * (percent.clamp(0.0, 100.0) / 100.0);
                self.scrub(range.start.saturating_add_ms(offset as u64));
            }
            Command::Speed(preset) => self.set_speed(preset.interval_ms()),
            Command::Step(preset) => self.set_step(preset.step_ms()),
            Command::MinMagnitude(min) => {
                self.set_magnitude_range(*min, self.filter.max_magnitude);
            }
            Command::MaxMagnitude(max) => {
                self.set_magnitude_range(self.filter.min_magnitude, *max);
            }
            Command::Search(query) => self.set_search(query.clone()),
            Command::Select(id) => {
                if self.select(id).is_none() {
                    warn!("event {id} is not in the filtered set");
                    return false;
                }
            }
            Command::Close => {
                self.close_popup();
            }
            Command::Filters => self.toggle_filters(),
            Command::Pan { lon, lat } => self.pan(LonLat::new(*lon, *lat)),
            Command::Zoom(zoom) => self.zoom(*zoom),
            Command::Refresh | Command::Show | Command::Help | Command::Quit => return false,
        }
        true
    }

    /// Runs every task due by `now`. Returns how many ran.
    pub fn advance(&mut self, now: Time) -> usize {
        let mut ran = 0usize;
        while let Some(task) = self.sched.poll_until(now) {
            self.handle(task);
            ran += 1;
        }
        self.sched.settle(now);
        ran
    }

    /// Unmount: cancels every dwell, the playback tick and any fly-to.
    /// Returns how many scheduled tasks were dropped.
    pub fn teardown(&mut self) -> usize {
        let requests = self.markers.teardown();
        self.apply_dwell(requests);
        self.player.pause(&mut self.sched);
        self.cancel_fly();
        self.popup = None;
        self.dwell_timers.clear();
        let dropped = self.sched.clear();
        debug!("viewer torn down, {dropped} leftover timers dropped");
        dropped
    }

    fn handle(&mut self, task: ViewerTask) {
        match task {
            ViewerTask::Tick(tick) => {
                self.metrics.inc("viewer.ticks");
                let Some(cursor) = self.player.on_tick(tick, &mut self.sched) else {
                    return;
                };
                self.filter.timeline_cursor = cursor;
                self.refresh();
                if !self.player.is_playing() {
                    info!("playback reached the end of the timeline");
                }
            }
            ViewerTask::Dwell(timer) => {
                self.dwell_timers.remove(&timer);
                self.markers.on_dwell_elapsed(&timer);
            }
            ViewerTask::FlyToArrived(sequence) => {
                let Some(fly) = self.fly.take_if(|f| f.sequence == sequence) else {
                    return;
                };
                if self.selection.is_current(sequence) {
                    self.popup = Some(fly.popup);
                }
            }
        }
    }

    /// Reconciles markers against the current filter and commits the dwell
    /// requests at the scheduler's `now`.
    fn refresh(&mut self) {
        let shown = filter_events(&self.events.events, &self.filter);
        let requests = self.markers.reconcile(shown.iter().copied());
        self.metrics.inc("viewer.reconciles");
        self.metrics
            .set_gauge("viewer.shown", i64::try_from(shown.len()).unwrap_or(i64::MAX));
        self.apply_dwell(requests);
    }

    fn apply_dwell(&mut self, requests: Vec<DwellRequest>) {
        for request in requests {
            match request {
                DwellRequest::Schedule { timer, delay_ms } => {
                    let id = self
                        .sched
                        .schedule_after(delay_ms, ViewerTask::Dwell(timer.clone()));
                    self.dwell_timers.insert(timer, id);
                }
                DwellRequest::Cancel(timer) => {
                    if let Some(id) = self.dwell_timers.remove(&timer) {
                        self.sched.cancel(id);
                    }
                }
            }
        }
    }

    fn start_fly(&mut self, fly: &FlyTo) {
        self.cancel_fly();
        self.popup = None;
        self.viewport.apply(fly);
        let timer = self
            .sched
            .schedule_after(fly.duration_ms, ViewerTask::FlyToArrived(fly.sequence));
        self.fly = Some(PendingFly {
            sequence: fly.sequence,
            timer,
            popup: fly.popup.clone(),
        });
        info!("flying to {} (zoom {})", fly.event, fly.zoom);
    }

    fn cancel_fly(&mut self) {
        if let Some(pending) = self.fly.take() {
            self.sched.cancel(pending.timer);
        }
    }
}
