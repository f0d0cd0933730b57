use std::env;

use clap::{Parser, ValueEnum};
use foundation::time::Time;
use layers::query::{DEFAULT_MAX_MAGNITUDE, DEFAULT_MIN_MAGNITUDE, FilterState};
use runtime::playback::{PlaybackConfig, SpeedPreset, StepPreset};
use streaming::cache::DEFAULT_TTL_MS;
use streaming::client::{FeedConfig, USGS_ALL_DAY_URL};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal viewer for the live earthquake feed")]
pub struct Args {
    /// Feed URL (default: $QUAKE_FEED_URL, else the USGS all-day summary)
    #[arg(long)]
    pub url: Option<String>,

    /// Response cache lifetime in seconds (default: $QUAKE_CACHE_TTL_SECS, else 120)
    #[arg(long)]
    pub cache_ttl_secs: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_MIN_MAGNITUDE, allow_negative_numbers = true)]
    pub min_mag: f64,

    #[arg(long, default_value_t = DEFAULT_MAX_MAGNITUDE, allow_negative_numbers = true)]
    pub max_mag: f64,

    /// Case-insensitive place filter, e.g. "Japan"
    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long, value_enum, default_value_t = Speed::Med)]
    pub speed: Speed,

    #[arg(long, value_enum, default_value_t = Step::Hour)]
    pub step: Step,

    /// Replay the timeline from its start
    #[arg(long)]
    pub play: bool,

    /// Event id to fly to once loaded
    #[arg(long)]
    pub select: Option<String>,

    /// Max rows in the event list
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Render a single frame and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Speed {
    Slow,
    Med,
    Fast,
}

impl From<Speed> for SpeedPreset {
    fn from(s: Speed) -> Self {
        match s {
            Speed::Slow => SpeedPreset::Slow,
            Speed::Med => SpeedPreset::Medium,
            Speed::Fast => SpeedPreset::Fast,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Step {
    #[value(name = "1h")]
    Hour,
    #[value(name = "1d")]
    Day,
    #[value(name = "1w")]
    Week,
}

impl From<Step> for StepPreset {
    fn from(s: Step) -> Self {
        match s {
            Step::Hour => StepPreset::Hour,
            Step::Day => StepPreset::Day,
            Step::Week => StepPreset::Week,
        }
    }
}

impl Args {
    pub fn feed_config(&self) -> FeedConfig {
        let url = self.url.clone().unwrap_or_else(|| {
            env::var("QUAKE_FEED_URL").unwrap_or_else(|_| USGS_ALL_DAY_URL.to_string())
        });
        let ttl_ms = self
            .cache_ttl_secs
            .or_else(|| {
                env::var("QUAKE_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
            })
            .map_or(DEFAULT_TTL_MS, |secs| secs.saturating_mul(1_000));
        FeedConfig { url, ttl_ms }
    }

    /// The cursor is placeholder until the timeline range is known.
    pub fn filter(&self) -> FilterState {
        FilterState {
            min_magnitude: self.min_mag,
            max_magnitude: self.max_mag,
            place_query: self.search.clone(),
            timeline_cursor: Time::MAX,
        }
    }

    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            speed_ms: SpeedPreset::from(self.speed).interval_ms(),
            step_ms: StepPreset::from(self.step).step_ms(),
        }
    }
}
