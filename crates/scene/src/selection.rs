use foundation::bounds::LonLat;
use foundation::ids::EventId;
use foundation::time::format_time;

use crate::event::Event;

pub const FLY_TO_DURATION_MS: u64 = 1_000;
pub const FLY_TO_MIN_ZOOM: u8 = 4;
pub const FLY_TO_MAX_ZOOM: u8 = 8;

/// Popup shown at the end of a fly-to.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub time: Option<String>,
    pub url: String,
}

impl Popup {
    pub fn for_event(event: &Event) -> Self {
        Self {
            title: event.label().to_string(),
            magnitude: event.magnitude_or_zero(),
            depth_km: event.depth_km,
            time: event.occurred_at.map(|t| format_time(Some(t))),
            url: event.detail_url.clone().unwrap_or_else(|| "#".to_string()),
        }
    }
}

/// Camera move + popup for one selected event.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyTo {
    /// Identifies this sequence; bumped on every new selection.
    pub sequence: u64,
    pub event: EventId,
    pub target: LonLat,
    pub zoom: u8,
    pub duration_ms: u64,
    pub popup: Popup,
}

/// Zoom level for flying to a magnitude: `floor(mag + 2)` in `[4, 8]`.
pub fn fly_to_zoom(magnitude: Option<f64>) -> u8 {
    let z = (magnitude.unwrap_or(0.0) + 2.0).floor();
    if !z.is_finite() {
        return FLY_TO_MIN_ZOOM;
    }
    z.clamp(f64::from(FLY_TO_MIN_ZOOM), f64::from(FLY_TO_MAX_ZOOM)) as u8
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    /// Nothing was in flight; a new sequence started.
    Started(FlyTo),
    /// The previous sequence was cancelled in favour of a new one.
    Switched { cancelled: u64, started: FlyTo },
    /// The event was already selected.
    Unchanged,
    /// Popup closed or selection dropped.
    Cleared { cancelled: Option<u64> },
}

/// Currently selected event and its in-flight fly-to sequence.
#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<EventId>,
    active: Option<u64>,
    next_sequence: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_id(&self) -> Option<&EventId> {
        self.selected.as_ref()
    }

    /// `true` while `sequence` is the live one; a cancelled camera move checks
    /// this before applying its next step.
    pub fn is_current(&self, sequence: u64) -> bool {
        self.active == Some(sequence)
    }

    pub fn select(&mut self, event: &Event) -> SelectionChange {
        if self.selected.as_ref() == Some(&event.id) {
            return SelectionChange::Unchanged;
        }

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let started = FlyTo {
            sequence,
            event: event.id.clone(),
            target: event.position(),
            zoom: fly_to_zoom(event.magnitude),
            duration_ms: FLY_TO_DURATION_MS,
            popup: Popup::for_event(event),
        };

        self.selected = Some(event.id.clone());
        match self.active.replace(sequence) {
            Some(cancelled) => SelectionChange::Switched { cancelled, started },
            None => SelectionChange::Started(started),
        }
    }

    pub fn close_popup(&mut self) -> SelectionChange {
        self.selected = None;
        SelectionChange::Cleared {
            cancelled: self.active.take(),
        }
    }

    /// Looks the selection up in the currently shown set. A selected event
    /// filtered out of view resolves to nothing.
    pub fn resolve<'a>(&self, shown: &[&'a Event]) -> Option<&'a Event> {
        let id = self.selected.as_ref()?;
        shown.iter().copied().find(|e| &e.id == id)
    }
}
