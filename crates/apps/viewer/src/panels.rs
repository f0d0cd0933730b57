//! Text renderings of the viewer panels. Every panel is drawn inside its own
//! [`ErrorBoundary`], so one failing panel never blanks the others.

use std::fmt::{self, Write as _};

use foundation::time::format_time;
use layers::query::FilterState;
use layers::symbology::{hover_color, legend, magnitude_color, marker_style};
use runtime::playback::{SpeedPreset, TimelinePlayer};
use scene::event::Event;
use scene::markers::{MarkerLifecycle, MarkerPhase};
use scene::selection::Popup;
use scene::viewport::Viewport;

use crate::app::{FeedStatus, ViewerState};
use crate::boundary::ErrorBoundary;

pub const TITLE: &str = "Earthquake Visualizer";
pub const EMPTY_LIST: &str = "No events match filters";
const PROGRESS_WIDTH: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("formatting failed")]
    Format(#[from] fmt::Error),

    #[error("event {id} has a non-finite {field}")]
    NonFinite { id: String, field: &'static str },
}

pub fn header(status: &FeedStatus, total: usize) -> Result<String, PanelError> {
    let mut out = String::new();
    write!(out, "{TITLE}")?;
    match status {
        FeedStatus::Loading => write!(out, " | loading...")?,
        FeedStatus::Ready { fetched_at } => write!(
            out,
            " | {total} events | updated {}",
            format_time(Some(*fetched_at))
        )?,
        FeedStatus::Failed(err) => write!(out, " | {err}")?,
    }
    Ok(out)
}

pub fn legend_bar() -> Result<String, PanelError> {
    let mut out = String::from("Magnitude:");
    for entry in legend() {
        write!(out, "  o {} {}", entry.label, entry.color.to_hex())?;
    }
    Ok(out)
}

/// The filter panel while it is hidden: counts only.
pub fn collapsed_sidebar(shown: usize, total: usize) -> Result<String, PanelError> {
    let mut out = String::new();
    write!(out, "[Filter Events] (`filters` to open)  Total: {total}  Filtered: {shown}")?;
    Ok(out)
}

/// Event list with the filter summary on top.
pub fn sidebar(
    shown: &[&Event],
    total: usize,
    filter: &FilterState,
    selected: Option<&Event>,
    limit: usize,
) -> Result<String, PanelError> {
    let mut out = String::new();
    writeln!(
        out,
        "Magnitude Range: {:.1} - {:.1}",
        filter.min_magnitude, filter.max_magnitude
    )?;
    if !filter.place_query.is_empty() {
        writeln!(out, "Search: \"{}\"", filter.place_query)?;
    }
    if filter.is_inverted() {
        writeln!(out, "(min is above max; nothing can match)")?;
    }
    writeln!(out, "Total: {total}  Filtered: {}", shown.len())?;

    if shown.is_empty() {
        write!(out, "{EMPTY_LIST}")?;
        return Ok(out);
    }

    for event in shown.iter().take(limit) {
        let mag = event.magnitude_or_zero();
        if !mag.is_finite() {
            return Err(PanelError::NonFinite {
                id: event.id.to_string(),
                field: "magnitude",
            });
        }
        let is_selected = selected.is_some_and(|s| s.id == event.id);
        write!(
            out,
            "{} M{mag:.1}, {}  {}  {}",
            if is_selected { '>' } else { ' ' },
            format_time(Some(event.occurred_at_or_epoch())),
            event.place.as_deref().unwrap_or("Unknown"),
            magnitude_color(event.magnitude).to_hex()
        )?;
        if is_selected {
            write!(out, " (hover {})", hover_color(event.magnitude).to_hex())?;
        }
        writeln!(out)?;
    }
    if shown.len() > limit {
        writeln!(out, "  ... and {} more", shown.len() - limit)?;
    }
    Ok(out.trim_end().to_string())
}

pub fn timeline(player: &TimelinePlayer) -> Result<String, PanelError> {
    let percent = player.progress_percent();
    let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    let speed = SpeedPreset::ALL
        .iter()
        .find(|p| p.interval_ms() == player.speed_ms())
        .map_or_else(|| format!("{}ms", player.speed_ms()), |p| p.label().to_string());

    let mut out = String::new();
    write!(
        out,
        "[{}] [{}{}] {percent:>3.0}%  {}  Step: {}  Speed: {speed}",
        if player.is_playing() { "Pause" } else { "Play" },
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        format_time(Some(player.cursor())),
        player.step_label(),
    )?;
    Ok(out)
}

/// Marker table standing in for the map.
pub fn map(
    markers: &MarkerLifecycle,
    viewport: &Viewport,
    popup: Option<&Popup>,
) -> Result<String, PanelError> {
    let mut out = String::new();
    writeln!(
        out,
        "Map center {:.2}, {:.2}  zoom {:.0}  ({} entering, {} visible, {} exiting)",
        viewport.center.lat,
        viewport.center.lon,
        viewport.zoom,
        markers.count_in(MarkerPhase::Entering),
        markers.count_in(MarkerPhase::Visible),
        markers.count_in(MarkerPhase::Exiting),
    )?;

    for marker in markers.entries() {
        let e = &marker.event;
        if !(e.latitude.is_finite() && e.longitude.is_finite()) {
            return Err(PanelError::NonFinite {
                id: e.id.to_string(),
                field: "position",
            });
        }
        let style = marker_style(marker);
        writeln!(
            out,
            "  {:<14} {:>8.3} {:>9.3}  {:>5.1}px  {}  opacity {:.2} scale {:.2}  {:?}",
            e.id.as_str(),
            e.latitude,
            e.longitude,
            style.diameter_px,
            style.color.to_hex(),
            style.opacity,
            style.scale,
            marker.phase,
        )?;
    }

    if let Some(p) = popup {
        writeln!(out, "+ {}", p.title)?;
        writeln!(out, "| Magnitude: {:.1}", p.magnitude)?;
        writeln!(out, "| Depth: {:.1} km", p.depth_km)?;
        writeln!(out, "| Time: {}", p.time.as_deref().unwrap_or("Unknown"))?;
        writeln!(out, "| {}", p.url)?;
    }
    Ok(out.trim_end().to_string())
}

/// The full frame: one boundary per panel.
pub struct Screen {
    limit: usize,
    header: ErrorBoundary,
    legend: ErrorBoundary,
    sidebar: ErrorBoundary,
    map: ErrorBoundary,
    timeline: ErrorBoundary,
}

impl Screen {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            header: ErrorBoundary::new("header"),
            legend: ErrorBoundary::new("legend"),
            sidebar: ErrorBoundary::new("sidebar"),
            map: ErrorBoundary::new("map"),
            timeline: ErrorBoundary::new("timeline"),
        }
    }

    pub fn render(&mut self, state: &ViewerState) -> String {
        let shown = state.shown();
        let selected = state.selection().resolve(&shown);
        let total = state.events().len();

        let sections = [
            self.header.render(|| header(state.status(), total)),
            self.legend.render(legend_bar),
            self.sidebar.render(|| {
                if state.filters_open() {
                    sidebar(&shown, total, state.filter(), selected, self.limit)
                } else {
                    collapsed_sidebar(shown.len(), total)
                }
            }),
            self.map
                .render(|| map(state.markers(), state.viewport(), state.popup())),
            self.timeline.render(|| timeline(state.player())),
        ];
        sections.join("\n\n")
    }
}
