use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How frames of one classification (working or non-working) are laid out.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode {
    Visible,
    Hidden,
    Cropped,
}

impl FrameMode {
    pub fn label(&self) -> &'static str {
        match self {
            FrameMode::Visible => "visible",
            FrameMode::Hidden => "hidden",
            FrameMode::Cropped => "cropped",
        }
    }

    pub fn next(self) -> Self {
        match self {
            FrameMode::Visible => FrameMode::Hidden,
            FrameMode::Hidden => FrameMode::Cropped,
            FrameMode::Cropped => FrameMode::Visible,
        }
    }
}

impl fmt::Display for FrameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FrameMode {
    type Err = ColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" => Ok(FrameMode::Visible),
            "hidden" => Ok(FrameMode::Hidden),
            "cropped" => Ok(FrameMode::Cropped),
            other => Err(ColumnError::UnknownFrameMode(other.to_string())),
        }
    }
}

/// Horizontal extent in axis units. `left` is `None` once a frame is cropped away.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Size {
    pub left: Option<f64>,
    pub width: f64,
}

/// An interval as handed out by a calendar. Missing edges mean "day bound".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTimeFrame {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub working: bool,
    pub magnet: bool,
    pub priority: i32,
}

impl RawTimeFrame {
    pub fn new(working: bool) -> Self {
        RawTimeFrame {
            start: None,
            end: None,
            working,
            magnet: false,
            priority: 0,
        }
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime, working: bool) -> Self {
        RawTimeFrame {
            start: Some(start),
            end: Some(end),
            ..RawTimeFrame::new(working)
        }
    }

    pub fn with_magnet(mut self, magnet: bool) -> Self {
        self.magnet = magnet;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// A classified sub-interval of a column, owned by that column along with its geometry.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TimeFrame {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub working: bool,
    pub magnet: bool,
    pub left: Option<f64>,
    pub width: f64,
    pub hidden: bool,
    pub cropped: bool,
    pub original_size: Size,
}

impl TimeFrame {
    pub(crate) fn new(start: NaiveDateTime, end: NaiveDateTime, working: bool, magnet: bool) -> Self {
        TimeFrame {
            start,
            end,
            working,
            magnet,
            left: Some(0.0),
            width: 0.0,
            hidden: false,
            cropped: false,
            original_size: Size {
                left: Some(0.0),
                width: 0.0,
            },
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    /// Closed-interval containment, the test used by position lookups.
    pub fn covers(&self, date: NaiveDateTime) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn contains(&self, date: NaiveDateTime) -> bool {
        date >= self.start && date < self.end
    }

    pub fn mode_in(&self, working_mode: FrameMode, non_working_mode: FrameMode) -> FrameMode {
        if self.working {
            working_mode
        } else {
            non_working_mode
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ColumnError {
    #[error("invalid column range: end {end} is not after start {start}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("negative column width: {0}")]
    NegativeWidth(f64),
    #[error("column geometry must be finite: left {left}, width {width}")]
    NonFiniteGeometry { left: f64, width: f64 },
    #[error("calendar broke its contract for {day}: {reason}")]
    CalendarContract { day: NaiveDate, reason: String },
    #[error("unknown magnet unit: {0}")]
    UnknownMagnetUnit(String),
    #[error("unknown frame mode: {0}")]
    UnknownFrameMode(String),
}
