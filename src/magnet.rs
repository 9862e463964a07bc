//! Snapping of dragged dates: unit rounding, column edges and frame boundaries.

use crate::column::Column;
use crate::model::ColumnError;
use chrono::{
    Datelike, Duration as ChronoDuration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Rounding units from finest to coarsest, plus `Column` for edge snapping.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MagnetUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    #[serde(alias = "date")]
    Day,
    Month,
    Year,
    Column,
}

impl MagnetUnit {
    pub const ALL: [MagnetUnit; 8] = [
        MagnetUnit::Millisecond,
        MagnetUnit::Second,
        MagnetUnit::Minute,
        MagnetUnit::Hour,
        MagnetUnit::Day,
        MagnetUnit::Month,
        MagnetUnit::Year,
        MagnetUnit::Column,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MagnetUnit::Millisecond => "millisecond",
            MagnetUnit::Second => "second",
            MagnetUnit::Minute => "minute",
            MagnetUnit::Hour => "hour",
            MagnetUnit::Day => "day",
            MagnetUnit::Month => "month",
            MagnetUnit::Year => "year",
            MagnetUnit::Column => "column",
        }
    }

    pub fn next(self) -> Self {
        let idx = MagnetUnit::ALL.iter().position(|u| *u == self).unwrap_or(0);
        MagnetUnit::ALL[(idx + 1) % MagnetUnit::ALL.len()]
    }
}

impl fmt::Display for MagnetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MagnetUnit {
    type Err = ColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "ms" {
            return Ok(MagnetUnit::Millisecond);
        }
        let unit = match normalized.strip_suffix('s').unwrap_or(&normalized) {
            "millisecond" => MagnetUnit::Millisecond,
            "second" => MagnetUnit::Second,
            "minute" => MagnetUnit::Minute,
            "hour" => MagnetUnit::Hour,
            "day" | "date" => MagnetUnit::Day,
            "month" => MagnetUnit::Month,
            "year" => MagnetUnit::Year,
            "column" => MagnetUnit::Column,
            _ => return Err(ColumnError::UnknownMagnetUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// Tie policy when a date falls between two multiples.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Midpoint {
    #[default]
    Nearest,
    Up,
    Down,
}

impl Midpoint {
    fn apply(self, value: f64) -> f64 {
        match self {
            Midpoint::Nearest => value.round(),
            Midpoint::Up => value.ceil(),
            Midpoint::Down => value.floor(),
        }
    }
}

impl FromStr for Midpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Midpoint::Nearest),
            "up" => Ok(Midpoint::Up),
            "down" => Ok(Midpoint::Down),
            other => Err(format!("unknown midpoint policy: {}", other)),
        }
    }
}

/// Snap settings. A zero `value` or a missing `unit` disables snapping.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Magnet {
    pub value: u32,
    pub unit: Option<MagnetUnit>,
    pub time_frames: bool,
    pub midpoint: Midpoint,
}

impl Magnet {
    pub const NONE: Magnet = Magnet {
        value: 0,
        unit: None,
        time_frames: false,
        midpoint: Midpoint::Nearest,
    };

    pub fn new(value: u32, unit: MagnetUnit) -> Self {
        Magnet {
            value,
            unit: Some(unit),
            ..Magnet::NONE
        }
    }

    pub fn with_time_frames(mut self, time_frames: bool) -> Self {
        self.time_frames = time_frames;
        self
    }

    pub fn with_midpoint(mut self, midpoint: Midpoint) -> Self {
        self.midpoint = midpoint;
        self
    }

    pub fn is_active(&self) -> bool {
        self.value > 0 && self.unit.is_some()
    }
}

/// Rounds `date` to a multiple of `offset` units, dropping everything finer.
///
/// The unit's field is measured with its finer fields as a fraction, so
/// `10:40` rounds to `11:00` at hour precision. Days count from 1 like the
/// day of month; months count from 0 so quarters land on Jan/Apr/Jul/Oct.
/// Results overflow into the parent field (minute 60 is the next hour).
pub fn round_to(
    date: NaiveDateTime,
    unit: MagnetUnit,
    offset: u32,
    midpoint: Midpoint,
) -> NaiveDateTime {
    let offset = f64::from(offset.max(1));
    let midnight = date.date().and_time(NaiveTime::default());
    match unit {
        MagnetUnit::Millisecond => {
            let parent = date.with_nanosecond(0).unwrap_or(date);
            round_fixed(date, parent, 1, offset, midpoint)
        }
        MagnetUnit::Second => {
            let parent = midnight + ChronoDuration::minutes(i64::from(date.hour() * 60 + date.minute()));
            round_fixed(date, parent, 1_000, offset, midpoint)
        }
        MagnetUnit::Minute => {
            let parent = midnight + ChronoDuration::hours(i64::from(date.hour()));
            round_fixed(date, parent, 60_000, offset, midpoint)
        }
        MagnetUnit::Hour => round_fixed(date, midnight, 3_600_000, offset, midpoint),
        MagnetUnit::Day => {
            let month_start = first_of_month(date.date()).and_time(NaiveTime::default());
            let value = 1.0 + millis_between(month_start, date) / MILLIS_PER_DAY;
            let day = midpoint.apply(value / offset) * offset;
            month_start + ChronoDuration::days(day as i64 - 1)
        }
        MagnetUnit::Month => {
            let month_start = first_of_month(date.date());
            let next_month = month_start
                .checked_add_months(Months::new(1))
                .unwrap_or(month_start);
            let month_length = (next_month - month_start).num_days().max(1) as f64;
            let value = f64::from(date.month0())
                + millis_between(month_start.and_time(NaiveTime::default()), date)
                    / (month_length * MILLIS_PER_DAY);
            let months = (midpoint.apply(value / offset) * offset).max(0.0) as u32;
            NaiveDate::from_ymd_opt(date.year(), 1, 1)
                .and_then(|year_start| year_start.checked_add_months(Months::new(months)))
                .map_or(date, |d| d.and_time(NaiveTime::default()))
        }
        MagnetUnit::Year => {
            let days_in_year = if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
                366.0
            } else {
                365.0
            };
            let value = f64::from(date.year())
                + (f64::from(date.ordinal0()) + millis_between(midnight, date) / MILLIS_PER_DAY)
                    / days_in_year;
            let year = midpoint.apply(value / offset) * offset;
            NaiveDate::from_ymd_opt(year as i32, 1, 1)
                .map_or(date, |d| d.and_time(NaiveTime::default()))
        }
        MagnetUnit::Column => date,
    }
}

fn round_fixed(
    date: NaiveDateTime,
    parent: NaiveDateTime,
    unit_ms: i64,
    offset: f64,
    midpoint: Midpoint,
) -> NaiveDateTime {
    let step = unit_ms as f64 * offset;
    let steps = midpoint.apply(millis_between(parent, date) / step);
    parent + ChronoDuration::milliseconds((steps * step) as i64)
}

fn millis_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

impl Column {
    /// Applies `magnet` to `date`.
    ///
    /// Column mode snaps to whichever column edge is nearer on the axis.
    /// Other units round and clamp back into the column. With `time_frames`
    /// set, a working/non-working boundary strictly closer to the raw date
    /// than the rounded one wins; the first such boundary wins ties.
    pub fn resolve_magnet(&self, date: NaiveDateTime, magnet: &Magnet) -> NaiveDateTime {
        let Some(unit) = magnet.unit.filter(|_| magnet.value > 0) else {
            return date;
        };

        let snapped = match unit {
            MagnetUnit::Column => {
                if self.local_position(date) < self.width() / 2.0 {
                    self.date()
                } else {
                    self.end_date()
                }
            }
            unit => {
                round_to(date, unit, magnet.value, magnet.midpoint).clamp(self.date(), self.end_date())
            }
        };

        if magnet.time_frames {
            let rounded_distance = (date - snapped).num_milliseconds().abs();
            if let Some(boundary) = self.nearest_boundary(date, rounded_distance) {
                return boundary;
            }
        }
        snapped
    }

    fn nearest_boundary(&self, date: NaiveDateTime, max_distance: i64) -> Option<NaiveDateTime> {
        let frames = self.time_frames();
        let mut best: Option<(i64, NaiveDateTime)> = None;
        for (idx, frame) in frames.iter().enumerate() {
            if !frame.magnet {
                continue;
            }
            let opens_run = idx == 0 || frames[idx - 1].working != frame.working;
            let closes_run = frames
                .get(idx + 1)
                .map_or(true, |next| next.working != frame.working);
            for (eligible, boundary) in [(opens_run, frame.start), (closes_run, frame.end)] {
                if !eligible {
                    continue;
                }
                let distance = (date - boundary).num_milliseconds().abs();
                if distance < max_distance && best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, boundary));
                }
            }
        }
        best.map(|(_, boundary)| boundary)
    }
}

#[cfg(test)]
#[path = "magnet_test.rs"]
mod tests;
