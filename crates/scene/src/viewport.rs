use foundation::bounds::{GeoBounds, LonLat};

use crate::event::Event;
use crate::selection::FlyTo;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 18.0;
/// Center used when there is nothing to look at.
pub const DEFAULT_CENTER: LonLat = LonLat::new(0.0, 20.0);

/// World-map camera. Latitude is clamped to the mercator band, longitude wraps.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: LonLat,
    pub zoom: f64,
    pub bounds: GeoBounds,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: MIN_ZOOM,
            bounds: GeoBounds::WORLD,
        }
    }
}

impl Viewport {
    /// Centered on the first shown event, else the default center.
    pub fn initial(shown: &[&Event]) -> Self {
        let mut v = Self::default();
        if let Some(first) = shown.first() {
            v.pan_to(first.position());
        }
        v
    }

    pub fn pan_to(&mut self, center: LonLat) {
        self.center = self.bounds.normalize(center);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn apply(&mut self, fly: &FlyTo) {
        self.pan_to(fly.target);
        self.set_zoom(f64::from(fly.zoom));
    }
}
