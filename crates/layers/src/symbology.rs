//! Magnitude symbology shared by the legend, map markers and sidebar list.
//!
//! Every visual encoding of an event goes through this module so the three
//! views can never disagree about what a color or size means.

use std::fmt;

use scene::markers::{Marker, MarkerPhase};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    BadLength(usize),
    BadDigit(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorParseError::BadLength(n) => write!(f, "expected 6 hex digits, got {n}"),
            ColorParseError::BadDigit(s) => write!(f, "invalid hex color component: {s}"),
        }
    }
}

impl std::error::Error for ColorParseError {}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (leading `#` optional).
    pub fn parse_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::BadLength(digits.len()));
        }
        let channel = |range: std::ops::Range<usize>| {
            let part = &digits[range];
            u8::from_str_radix(part, 16).map_err(|_| ColorParseError::BadDigit(part.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Scales each channel by `1 + percent`, flooring and saturating at 255.
    pub fn brighten(self, percent: f64) -> Self {
        let scale = |c: u8| (f64::from(c) * (1.0 + percent)).floor().clamp(0.0, 255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

pub const UNKNOWN_COLOR: Rgb = Rgb::new(0x9c, 0xa3, 0xaf);
pub const MICRO_COLOR: Rgb = Rgb::new(0x84, 0xcc, 0x16);
pub const MINOR_COLOR: Rgb = Rgb::new(0xea, 0xb3, 0x08);
pub const LIGHT_COLOR: Rgb = Rgb::new(0xf5, 0x9e, 0x0b);
pub const MODERATE_COLOR: Rgb = Rgb::new(0xf9, 0x73, 0x16);
pub const STRONG_COLOR: Rgb = Rgb::new(0xdc, 0x26, 0x26);
pub const MAJOR_COLOR: Rgb = Rgb::new(0x7f, 0x1d, 0x1d);

/// Lower bounds of the six magnitude buckets, as listed in the legend.
pub const LEGEND_BUCKETS: [f64; 6] = [0.0, 2.0, 3.0, 4.0, 5.0, 6.0];

/// Bucket color for a magnitude; gray when unknown.
pub fn magnitude_color(magnitude: Option<f64>) -> Rgb {
    let Some(m) = magnitude else {
        return UNKNOWN_COLOR;
    };
    if m >= 6.0 {
        MAJOR_COLOR
    } else if m >= 5.0 {
        STRONG_COLOR
    } else if m >= 4.0 {
        MODERATE_COLOR
    } else if m >= 3.0 {
        LIGHT_COLOR
    } else if m >= 2.0 {
        MINOR_COLOR
    } else {
        MICRO_COLOR
    }
}

/// Sidebar hover color: stronger events brighten more.
pub fn hover_color(magnitude: Option<f64>) -> Rgb {
    let m = magnitude.unwrap_or(0.0);
    magnitude_color(magnitude).brighten(0.25 + m * 0.05)
}

pub const MARKER_MIN_DIAMETER_PX: f64 = 8.0;

/// Map marker diameter in pixels; floor 8, +3px per magnitude unit.
pub fn marker_diameter(magnitude: Option<f64>) -> f64 {
    let m = magnitude.unwrap_or(0.0);
    (MARKER_MIN_DIAMETER_PX + m * 3.0).max(MARKER_MIN_DIAMETER_PX)
}

pub const MIN_RADIUS: f64 = 4.0;

/// Circle radius used by list badges; grows with the square of magnitude.
pub fn magnitude_radius(magnitude: Option<f64>) -> f64 {
    match magnitude {
        None => MIN_RADIUS,
        Some(m) => (m * m * 1.6).max(MIN_RADIUS),
    }
}

/// Opacity and scale of a marker in each lifecycle phase. Entering and
/// exiting markers are fully transparent, so both transitions are fades.
pub const fn phase_appearance(phase: MarkerPhase) -> (f64, f64) {
    match phase {
        MarkerPhase::Entering => (0.0, 0.6),
        MarkerPhase::Visible => (0.95, 1.0),
        MarkerPhase::Exiting => (0.0, 0.5),
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    pub diameter_px: f64,
    pub color: Rgb,
    pub opacity: f64,
    pub scale: f64,
}

pub fn marker_style(marker: &Marker) -> MarkerStyle {
    let (opacity, scale) = phase_appearance(marker.phase);
    MarkerStyle {
        diameter_px: marker_diameter(marker.event.magnitude),
        color: magnitude_color(marker.event.magnitude),
        opacity,
        scale,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

pub fn legend() -> Vec<LegendEntry> {
    LEGEND_BUCKETS
        .iter()
        .map(|b| LegendEntry {
            label: format!("{b}+"),
            color: magnitude_color(Some(*b)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::event::Event;
    use scene::markers::MarkerLifecycle;

    #[test]
    fn buckets_follow_boundaries() {
        assert_eq!(magnitude_color(Some(6.5)), MAJOR_COLOR);
        assert_eq!(magnitude_color(Some(6.0)), MAJOR_COLOR);
        assert_eq!(magnitude_color(Some(5.99)), STRONG_COLOR);
        assert_eq!(magnitude_color(Some(4.2)), MODERATE_COLOR);
        assert_eq!(magnitude_color(Some(3.0)), LIGHT_COLOR);
        assert_eq!(magnitude_color(Some(2.5)), MINOR_COLOR);
        assert_eq!(magnitude_color(Some(-0.4)), MICRO_COLOR);
        assert_eq!(magnitude_color(None), UNKNOWN_COLOR);
        assert_eq!(magnitude_color(Some(6.5)), magnitude_color(Some(6.5)));
    }

    #[test]
    fn palette_matches_hex_values() {
        assert_eq!(MAJOR_COLOR.to_hex(), "#7f1d1d");
        assert_eq!(MODERATE_COLOR.to_hex(), "#f97316");
        assert_eq!(UNKNOWN_COLOR.to_hex(), "#9ca3af");
        assert_eq!(Rgb::parse_hex("#eab308"), Ok(MINOR_COLOR));
        assert_eq!(Rgb::parse_hex("84cc16"), Ok(MICRO_COLOR));
        assert_eq!(Rgb::parse_hex("#abc"), Err(ColorParseError::BadLength(3)));
        assert!(matches!(
            Rgb::parse_hex("#zz0000"),
            Err(ColorParseError::BadDigit(_))
        ));
    }

    #[test]
    fn brighten_scales_and_saturates() {
        assert_eq!(Rgb::new(100, 50, 0).brighten(0.5), Rgb::new(150, 75, 0));
        assert_eq!(Rgb::new(200, 201, 10).brighten(0.3), Rgb::new(255, 255, 13));
        assert_eq!(STRONG_COLOR.brighten(0.0), STRONG_COLOR);
        assert_eq!(hover_color(Some(5.0)), STRONG_COLOR.brighten(0.5));
    }

    #[test]
    fn sizes_are_monotonic_with_floors() {
        assert_eq!(marker_diameter(None), 8.0);
        assert_eq!(marker_diameter(Some(-2.0)), 8.0);
        assert_eq!(marker_diameter(Some(2.0)), 14.0);
        assert!(marker_diameter(Some(5.1)) > marker_diameter(Some(5.0)));

        assert_eq!(magnitude_radius(None), 4.0);
        assert_eq!(magnitude_radius(Some(1.0)), 4.0);
        assert_eq!(magnitude_radius(Some(5.0)), 40.0);
    }

    #[test]
    fn marker_style_depends_on_phase_only_for_fade() {
        let mut markers = MarkerLifecycle::new();
        let e = Event::new("a").with_magnitude(4.0);
        markers.reconcile([&e]);
        let marker = markers.entries().next().unwrap();

        let style = marker_style(marker);
        assert_eq!(style.opacity, 0.0);
        assert_eq!(style.scale, 0.6);
        assert_eq!(style.diameter_px, 20.0);
        assert_eq!(style.color, MODERATE_COLOR);
        assert_eq!(phase_appearance(MarkerPhase::Visible), (0.95, 1.0));
    }

    #[test]
    fn legend_lists_six_buckets() {
        let l = legend();
        let labels: Vec<&str> = l.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["0+", "2+", "3+", "4+", "5+", "6+"]);
        assert_eq!(l[0].color, MICRO_COLOR);
        assert_eq!(l[5].color, MAJOR_COLOR);
    }
}
