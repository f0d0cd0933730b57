use foundation::time::{Time, TimeSpan};
use scene::event::Event;

pub const DEFAULT_MIN_MAGNITUDE: f64 = 0.0;
pub const DEFAULT_MAX_MAGNITUDE: f64 = 10.0;

/// User-controlled narrowing of the event set.
///
/// Bounds are not validated: an inverted magnitude range simply matches
/// nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    /// Case-insensitive substring of the place label.
    pub place_query: String,
    /// Only events at or before this instant are shown.
    pub timeline_cursor: Time,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
            place_query: String::new(),
            timeline_cursor: Time::MAX,
        }
    }
}

impl FilterState {
    pub fn is_inverted(&self) -> bool {
        self.min_magnitude > self.max_magnitude
    }

    pub fn matches(&self, event: &Event) -> bool {
        let needle = self.place_query.to_lowercase();
        self.matches_with_needle(event, &needle)
    }

    fn matches_with_needle(&self, event: &Event, needle: &str) -> bool {
        magnitude_allows(event, self.min_magnitude, self.max_magnitude)
            && place_allows(event, needle)
            && time_allows(event, self.timeline_cursor)
    }
}

fn magnitude_allows(event: &Event, min: f64, max: f64) -> bool {
    let m = event.magnitude_or_zero();
    m >= min && m <= max
}

/// `needle` must already be lowercased. A missing place compares as the
/// empty string, so it only passes an empty query.
fn place_allows(event: &Event, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let Some(place) = event.place.as_deref() else {
        return false;
    };
    place.to_lowercase().contains(needle)
}

fn time_allows(event: &Event, cursor: Time) -> bool {
    event.occurred_at_or_epoch() <= cursor
}

/// Order-preserving subsequence of `events` matching `state`.
pub fn filter_events<'a>(events: &'a [Event], state: &FilterState) -> Vec<&'a Event> {
    let needle = state.place_query.to_lowercase();
    events
        .iter()
        .filter(|e| state.matches_with_needle(e, &needle))
        .collect()
}

/// Timeline range for a snapshot: earliest event time (or `now` if that is
/// earlier or nothing is dated) through `now`.
pub fn time_range(events: &[Event], now: Time) -> TimeSpan {
    let start = events
        .iter()
        .filter_map(|e| e.occurred_at)
        .fold(now, |acc, t| acc.min(t));
    TimeSpan::new(start, now)
}

#[cfg(test)]
mod tests {
    use super::{FilterState, filter_events, time_range};
    use foundation::time::{Time, TimeSpan};
    use pretty_assertions::assert_eq;
    use scene::event::Event;

    fn sample() -> Vec<Event> {
        vec![
            Event::new("a")
                .with_magnitude(5.2)
                .with_place("45 km SW of Tokyo, Japan")
                .with_time(Time(1_000)),
            Event::new("b")
                .with_magnitude(6.9)
                .with_place("Banda Sea")
                .with_time(Time(2_000)),
            Event::new("c")
                .with_magnitude(1.0)
                .with_place("5 km N of Anza, CA")
                .with_time(Time(3_000)),
            Event::new("d")
                .with_magnitude(3.3)
                .with_place("Hokkaido, JAPAN region")
                .with_time(Time(4_000)),
        ]
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn wide_open_filter_returns_everything_in_order() {
        let events = sample();
        let out = filter_events(&events, &FilterState::default());
        assert_eq!(ids(&out), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn magnitude_range_is_inclusive() {
        let events = sample();
        let state = FilterState {
            min_magnitude: 3.0,
            max_magnitude: 6.0,
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["a", "d"]);

        let state = FilterState {
            min_magnitude: 5.2,
            max_magnitude: 5.2,
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["a"]);
    }

    #[test]
    fn place_query_is_case_insensitive_substring() {
        let events = sample();
        let state = FilterState {
            place_query: "jApAn".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["a", "d"]);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let events = vec![
            Event::new("no-mag").with_place("Alaska"),
            Event::new("no-place").with_magnitude(2.0),
            Event::new("no-time").with_magnitude(2.0).with_place("Atacama, Chile"),
        ];

        // Unknown magnitude counts as 0.
        let state = FilterState {
            min_magnitude: 0.0,
            max_magnitude: 0.0,
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["no-mag"]);

        // Unknown place fails any non-empty query.
        let state = FilterState {
            place_query: "a".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["no-mag", "no-time"]);

        // Unknown time counts as the epoch.
        let state = FilterState {
            timeline_cursor: Time(0),
            ..FilterState::default()
        };
        assert_eq!(filter_events(&events, &state).len(), 3);
        let state = FilterState {
            timeline_cursor: Time(-1),
            ..FilterState::default()
        };
        assert!(filter_events(&events, &state).is_empty());
    }

    #[test]
    fn cursor_gates_on_or_before() {
        let events = sample();
        let state = FilterState {
            timeline_cursor: Time(2_000),
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["a", "b"]);
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let events = sample();
        let state = FilterState {
            min_magnitude: 6.0,
            max_magnitude: 3.0,
            ..FilterState::default()
        };
        assert!(state.is_inverted());
        assert!(filter_events(&events, &state).is_empty());
    }

    #[test]
    fn output_is_a_subsequence_of_input() {
        let events = sample();
        let state = FilterState {
            min_magnitude: 1.0,
            place_query: "a".to_string(),
            timeline_cursor: Time(3_500),
            ..FilterState::default()
        };
        let out = filter_events(&events, &state);

        let mut cursor = events.iter();
        for hit in &out {
            assert!(cursor.any(|e| std::ptr::eq(e, *hit)));
            assert!(state.matches(hit));
        }
        let rejected = events
            .iter()
            .filter(|e| !out.iter().any(|h| std::ptr::eq(*h, *e)));
        for e in rejected {
            assert!(!state.matches(e));
        }
    }

    #[test]
    fn range_spans_earliest_event_to_now() {
        let events = sample();
        assert_eq!(
            time_range(&events, Time(10_000)),
            TimeSpan::new(Time(1_000), Time(10_000))
        );
        assert_eq!(time_range(&[], Time(7)), TimeSpan::instant(Time(7)));
    }
}
