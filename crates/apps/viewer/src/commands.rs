use std::str::FromStr;

use foundation::ids::EventId;
use runtime::playback::{SpeedPreset, StepPreset};

pub const HELP: &str = "\
commands:
  play | pause | toggle         timeline playback
  rewind | end                  jump to the start or end of the timeline
  scrub <percent>               move the cursor to a point in the range
  speed slow|med|fast           tick interval
  step 1h|1d|1w                 cursor advance per tick
  min <mag> | max <mag>         magnitude range
  search [text]                 place filter (empty clears)
  filters                       show or hide the filter panel
  pan <lon> <lat> | zoom <n>    move the map
  select <id> | close           fly to an event / close its popup
  refresh                       refetch the feed
  show | help | quit";

/// One line of viewer input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Rewind,
    End,
    Scrub(f64),
    Speed(SpeedPreset),
    Step(StepPreset),
    MinMagnitude(f64),
    MaxMagnitude(f64),
    Search(String),
    Select(EventId),
    Close,
    Filters,
    Pan { lon: f64, lat: f64 },
    Zoom(f64),
    Refresh,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(v, r)| (v, r.trim()));

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "play" => Ok(Command::Play),
            "pause" => Ok(Command::Pause),
            "toggle" => Ok(Command::Toggle),
            "rewind" => Ok(Command::Rewind),
            "end" => Ok(Command::End),
            "scrub" => number(rest, "scrub", "a percentage").map(Command::Scrub),
            "speed" => match rest.to_ascii_lowercase().as_str() {
                "slow" => Ok(Command::Speed(SpeedPreset::Slow)),
                "med" | "medium" => Ok(Command::Speed(SpeedPreset::Medium)),
                "fast" => Ok(Command::Speed(SpeedPreset::Fast)),
                _ => Err(CommandError::BadArgument {
                    command: "speed",
                    expected: "slow, med or fast",
                }),
            },
            "step" => match rest {
                "1h" => Ok(Command::Step(StepPreset::Hour)),
                "1d" => Ok(Command::Step(StepPreset::Day)),
                "1w" => Ok(Command::Step(StepPreset::Week)),
                _ => Err(CommandError::BadArgument {
                    command: "step",
                    expected: "1h, 1d or 1w",
                }),
            },
            "min" => number(rest, "min", "a magnitude").map(Command::MinMagnitude),
            "max" => number(rest, "max", "a magnitude").map(Command::MaxMagnitude),
            "search" => Ok(Command::Search(rest.to_string())),
            "select" if !rest.is_empty() => Ok(Command::Select(EventId::from(rest))),
            "select" => Err(CommandError::BadArgument {
                command: "select",
                expected: "an event id",
            }),
            "close" => Ok(Command::Close),
            "filters" => Ok(Command::Filters),
            "pan" => {
                let expected = "a longitude and a latitude";
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(lon), Some(lat), None) => Ok(Command::Pan {
                        lon: number(lon, "pan", expected)?,
                        lat: number(lat, "pan", expected)?,
                    }),
                    _ => Err(CommandError::BadArgument {
                        command: "pan",
                        expected,
                    }),
                }
            }
            "zoom" => number(rest, "zoom", "a zoom level").map(Command::Zoom),
            "refresh" => Ok(Command::Refresh),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn number(
    raw: &str,
    command: &'static str,
    expected: &'static str,
) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(CommandError::BadArgument { command, expected })
}
