use foundation::time::{Time, TimeSpan};

use crate::scheduler::Scheduler;
use crate::timer_queue::TimerId;

pub const HOUR_MS: u64 = 3_600_000;
pub const DAY_MS: u64 = 24 * HOUR_MS;
pub const WEEK_MS: u64 = 7 * DAY_MS;

/// Tick interval presets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpeedPreset {
    Slow,
    Medium,
    Fast,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 3] = [SpeedPreset::Slow, SpeedPreset::Medium, SpeedPreset::Fast];

    pub const fn interval_ms(self) -> u64 {
        match self {
            SpeedPreset::Slow => 700,
            SpeedPreset::Medium => 350,
            SpeedPreset::Fast => 150,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SpeedPreset::Slow => "Slow",
            SpeedPreset::Medium => "Med",
            SpeedPreset::Fast => "Fast",
        }
    }
}

/// Cursor advance presets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepPreset {
    Hour,
    Day,
    Week,
}

impl StepPreset {
    pub const ALL: [StepPreset; 3] = [StepPreset::Hour, StepPreset::Day, StepPreset::Week];

    pub const fn step_ms(self) -> u64 {
        match self {
            StepPreset::Hour => HOUR_MS,
            StepPreset::Day => DAY_MS,
            StepPreset::Week => WEEK_MS,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StepPreset::Hour => "1h",
            StepPreset::Day => "1d",
            StepPreset::Week => "1w",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub speed_ms: u64,
    pub step_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_ms: SpeedPreset::Medium.interval_ms(),
            step_ms: StepPreset::Hour.step_ms(),
        }
    }
}

/// Scheduler payload for the playback interval.
///
/// Carries the arming token so a tick that raced a restart is recognised as
/// stale and dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlaybackTick {
    token: u64,
}

/// Timeline cursor that advances on a fixed interval while playing.
///
/// The player owns at most one pending tick on the scheduler. Every state
/// change that affects cadence (play, pause, speed, step) disarms the pending
/// tick first, so no advance ever lands after a pause.
#[derive(Debug)]
pub struct TimelinePlayer {
    range: TimeSpan,
    cursor: Time,
    playing: bool,
    speed_ms: u64,
    step_ms: u64,
    pending: Option<(TimerId, u64)>,
    next_token: u64,
}

impl TimelinePlayer {
    pub fn new(range: TimeSpan, cursor: Time, config: PlaybackConfig) -> Self {
        Self {
            range,
            cursor: range.clamp(cursor),
            playing: false,
            speed_ms: config.speed_ms.max(1),
            step_ms: config.step_ms,
            pending: None,
            next_token: 0,
        }
    }

    pub fn cursor(&self) -> Time {
        self.cursor
    }

    pub fn range(&self) -> TimeSpan {
        self.range
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn step_ms(&self) -> u64 {
        self.step_ms
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    pub fn play<T: From<PlaybackTick>>(&mut self, sched: &mut Scheduler<T>) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.arm(sched);
    }

    pub fn pause<T>(&mut self, sched: &mut Scheduler<T>) {
        self.playing = false;
        self.disarm(sched);
    }

    pub fn toggle<T: From<PlaybackTick>>(&mut self, sched: &mut Scheduler<T>) {
        if self.playing {
            self.pause(sched);
        } else {
            self.play(sched);
        }
    }

    /// Takes effect from the next tick; the cursor is untouched.
    pub fn set_speed<T: From<PlaybackTick>>(&mut self, speed_ms: u64, sched: &mut Scheduler<T>) {
        self.speed_ms = speed_ms.max(1);
        self.restart(sched);
    }

    pub fn set_step<T: From<PlaybackTick>>(&mut self, step_ms: u64, sched: &mut Scheduler<T>) {
        self.step_ms = step_ms;
        self.restart(sched);
    }

    /// Direct cursor input. Allowed in any state and never changes `playing`.
    pub fn scrub(&mut self, t: Time) -> Time {
        self.cursor = self.range.clamp(t);
        self.cursor
    }

    pub fn rewind(&mut self) -> Time {
        self.scrub(self.range.start)
    }

    pub fn fast_forward(&mut self) -> Time {
        self.scrub(self.range.end)
    }

    pub fn set_range(&mut self, range: TimeSpan) {
        self.range = range;
        self.cursor = range.clamp(self.cursor);
    }

    /// Handles a fired tick. Returns the new cursor when it advanced.
    pub fn on_tick<T: From<PlaybackTick>>(
        &mut self,
        tick: PlaybackTick,
        sched: &mut Scheduler<T>,
    ) -> Option<Time> {
        match self.pending {
            Some((_, token)) if token == tick.token => self.pending = None,
            _ => return None,
        }
        if !self.playing {
            return None;
        }

        let next = self.cursor.saturating_add_ms(self.step_ms).min(self.range.end);
        self.cursor = next;
        if next >= self.range.end {
            self.playing = false;
        } else {
            self.arm(sched);
        }
        Some(next)
    }

    /// Position of the cursor within the range, in `[0, 100]`.
    pub fn progress_percent(&self) -> f64 {
        let span = self.range.duration_ms();
        if span == 0 {
            return 0.0;
        }
        let done = self.cursor.millis_since(self.range.start);
        (done as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// `"Nh"` below a day, `"Nd"` otherwise.
    pub fn step_label(&self) -> String {
        if self.step_ms >= DAY_MS {
            format!("{}d", trim_units(self.step_ms, DAY_MS))
        } else {
            format!("{}h", trim_units(self.step_ms, HOUR_MS))
        }
    }

    fn restart<T: From<PlaybackTick>>(&mut self, sched: &mut Scheduler<T>) {
        if !self.playing {
            return;
        }
        self.disarm(sched);
        self.arm(sched);
    }

    fn arm<T: From<PlaybackTick>>(&mut self, sched: &mut Scheduler<T>) {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        let id = sched.schedule_after(self.speed_ms, T::from(PlaybackTick { token }));
        self.pending = Some((id, token));
    }

    fn disarm<T>(&mut self, sched: &mut Scheduler<T>) {
        if let Some((id, _)) = self.pending.take() {
            sched.cancel(id);
        }
    }
}

fn trim_units(ms: u64, unit: u64) -> String {
    if ms % unit == 0 {
        return (ms / unit).to_string();
    }
    let v = ms as f64 / unit as f64;
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::{PlaybackConfig, PlaybackTick, StepPreset, TimelinePlayer};
    use crate::scheduler::Scheduler;
    use foundation::time::{Time, TimeSpan};

    fn player(max: i64, step_ms: u64, speed_ms: u64) -> TimelinePlayer {
        TimelinePlayer::new(
            TimeSpan::new(Time(0), Time(max)),
            Time(0),
            PlaybackConfig { speed_ms, step_ms },
        )
    }

    fn drive(p: &mut TimelinePlayer, sched: &mut Scheduler<PlaybackTick>, until: i64) {
        sched.run_until(Time(until), |s, tick| {
            p.on_tick(tick, s);
        });
    }

    #[test]
    fn advances_one_step_per_interval() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(10_000, 1_000, 100);
        p.play(&mut sched);

        drive(&mut p, &mut sched, 500);
        assert_eq!(p.cursor(), Time(5_000));
        assert!(p.is_playing());
    }

    #[test]
    fn clamps_at_end_and_stops() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(10_000, 1_000, 100);
        p.play(&mut sched);

        drive(&mut p, &mut sched, 1_000);
        assert_eq!(p.cursor(), Time(10_000));
        assert!(!p.is_playing());
        assert!(!p.has_pending_tick());
        assert!(sched.is_idle());

        drive(&mut p, &mut sched, 5_000);
        assert_eq!(p.cursor(), Time(10_000));
    }

    #[test]
    fn uneven_step_clamps_to_max() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(2_500, 1_000, 100);
        p.play(&mut sched);

        drive(&mut p, &mut sched, 300);
        assert_eq!(p.cursor(), Time(2_500));
        assert!(!p.is_playing());
    }

    #[test]
    fn pause_cancels_pending_tick() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(10_000, 1_000, 100);
        p.play(&mut sched);

        drive(&mut p, &mut sched, 300);
        assert_eq!(p.cursor(), Time(3_000));
        p.pause(&mut sched);
        assert!(sched.is_idle());

        drive(&mut p, &mut sched, 800);
        assert_eq!(p.cursor(), Time(3_000));
        assert!(!p.is_playing());
    }

    #[test]
    fn speed_change_restarts_interval_keeping_cursor() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(10_000, 1_000, 100);
        p.play(&mut sched);

        drive(&mut p, &mut sched, 150);
        assert_eq!(p.cursor(), Time(1_000));

        p.set_speed(300, &mut sched);
        assert_eq!(p.cursor(), Time(1_000));
        assert_eq!(sched.pending(), 1);

        drive(&mut p, &mut sched, 449);
        assert_eq!(p.cursor(), Time(1_000));
        drive(&mut p, &mut sched, 450);
        assert_eq!(p.cursor(), Time(2_000));
    }

    #[test]
    fn step_change_applies_on_next_tick() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(100_000, 1_000, 100);
        p.play(&mut sched);

        drive(&mut p, &mut sched, 100);
        p.set_step(5_000, &mut sched);
        drive(&mut p, &mut sched, 200);
        assert_eq!(p.cursor(), Time(6_000));
    }

    #[test]
    fn stale_tick_is_ignored() {
        let mut sched = Scheduler::new(Time(0));
        let mut p = player(10_000, 1_000, 100);
        p.play(&mut sched);

        let mut fired = Vec::new();
        sched.run_until(Time(100), |_, tick| fired.push(tick));
        assert_eq!(fired.len(), 1);

        // The tick was consumed without the player seeing it; a restart
        // issues a new token, so the old one must not advance anything.
        p.set_speed(100, &mut sched);
        assert_eq!(p.on_tick(fired[0], &mut sched), None);
        assert_eq!(p.cursor(), Time(0));
    }

    #[test]
    fn scrub_is_independent_of_playing() {
        let mut sched: Scheduler<PlaybackTick> = Scheduler::new(Time(0));
        let mut p = player(10_000, 1_000, 100);
        p.play(&mut sched);

        assert_eq!(p.scrub(Time(7_000)), Time(7_000));
        assert!(p.is_playing());
        assert_eq!(p.scrub(Time(-5)), Time(0));
        assert_eq!(p.fast_forward(), Time(10_000));
        assert_eq!(p.rewind(), Time(0));

        p.pause(&mut sched);
        assert_eq!(p.scrub(Time(4_000)), Time(4_000));
        assert!(!p.is_playing());
    }

    #[test]
    fn progress_and_labels() {
        let mut p = player(10_000, StepPreset::Hour.step_ms(), 100);
        p.scrub(Time(2_500));
        assert_eq!(p.progress_percent(), 25.0);
        assert_eq!(p.step_label(), "1h");

        let flat = TimelinePlayer::new(
            TimeSpan::instant(Time(5)),
            Time(5),
            PlaybackConfig::default(),
        );
        assert_eq!(flat.progress_percent(), 0.0);

        let mut sched: Scheduler<PlaybackTick> = Scheduler::new(Time(0));
        p.set_step(StepPreset::Week.step_ms(), &mut sched);
        assert_eq!(p.step_label(), "7d");
        p.set_step(5_400_000, &mut sched);
        assert_eq!(p.step_label(), "1.5h");
    }
}
