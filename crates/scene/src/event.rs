use foundation::bounds::LonLat;
use foundation::ids::EventId;
use foundation::time::Time;

/// One seismic event as reported by the feed. Never mutated after decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    pub title: Option<String>,
    pub occurred_at: Option<Time>,
    pub longitude: f64,
    pub latitude: f64,
    pub depth_km: f64,
    pub detail_url: Option<String>,
}

impl Event {
    /// Bare event at the origin; the remaining fields are filled with the
    /// `with_*` builders.
    pub fn new(id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            magnitude: None,
            place: None,
            title: None,
            occurred_at: None,
            longitude: 0.0,
            latitude: 0.0,
            depth_km: 0.0,
            detail_url: None,
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn with_time(mut self, t: Time) -> Self {
        self.occurred_at = Some(t);
        self
    }

    pub fn with_position(mut self, longitude: f64, latitude: f64, depth_km: f64) -> Self {
        self.longitude = longitude;
        self.latitude = latitude;
        self.depth_km = depth_km;
        self
    }

    /// Magnitude with the feed's "unknown" folded to zero, as filtering and
    /// sizing expect.
    pub fn magnitude_or_zero(&self) -> f64 {
        self.magnitude.unwrap_or(0.0)
    }

    pub fn occurred_at_or_epoch(&self) -> Time {
        self.occurred_at.unwrap_or(Time::ZERO)
    }

    pub fn position(&self) -> LonLat {
        LonLat::new(self.longitude, self.latitude)
    }

    /// Place, else title, else a generic label.
    pub fn label(&self) -> &str {
        self.place
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("Event")
    }
}

/// One feed snapshot. Ids are unique within a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCollection {
    pub events: Vec<Event>,
}

impl EventCollection {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Earliest known event time.
    pub fn earliest(&self) -> Option<Time> {
        self.events.iter().filter_map(|e| e.occurred_at).min()
    }
}
