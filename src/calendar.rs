//! Working-time classification consumed by [`crate::column::Column`].
//!
//! A calendar answers two questions about a day: which raw intervals apply to
//! it (`classify`), and how those intervals settle into one ordered, gap-free
//! sequence covering the day (`resolve`). Columns check the second answer
//! before trusting it.

use crate::model::RawTimeFrame;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub trait Calendar {
    /// Raw intervals for `day`, in any order, possibly overlapping.
    fn classify(&self, day: NaiveDate) -> Vec<RawTimeFrame>;

    /// Ordered, gap-free, non-overlapping intervals covering `[day_start, day_end)`.
    fn resolve(
        &self,
        raw: Vec<RawTimeFrame>,
        day_start: NaiveDateTime,
        day_end: NaiveDateTime,
    ) -> Vec<RawTimeFrame> {
        solve(&raw, day_start, day_end)
    }
}

/// Flattens overlapping raw intervals into a partition of `[day_start, day_end)`.
///
/// Each piece of the day takes the covering interval with the highest
/// priority; on equal priority the later interval wins. Uncovered pieces
/// become non-working frames without magnet.
pub fn solve(
    raw: &[RawTimeFrame],
    day_start: NaiveDateTime,
    day_end: NaiveDateTime,
) -> Vec<RawTimeFrame> {
    let bounded: Vec<(NaiveDateTime, NaiveDateTime, usize)> = raw
        .iter()
        .enumerate()
        .filter_map(|(idx, frame)| {
            let start = frame.start.unwrap_or(day_start).max(day_start);
            let end = frame.end.unwrap_or(day_end).min(day_end);
            (start < end).then_some((start, end, idx))
        })
        .collect();

    let mut cuts = vec![day_start, day_end];
    for (start, end, _) in &bounded {
        cuts.push(*start);
        cuts.push(*end);
    }
    cuts.sort();
    cuts.dedup();

    let mut solved: Vec<(RawTimeFrame, Option<usize>)> = Vec::new();
    for pair in cuts.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let winner = bounded
            .iter()
            .filter(|(start, end, _)| *start <= from && *end >= to)
            .max_by_key(|(_, _, idx)| (raw[*idx].priority, *idx))
            .map(|(_, _, idx)| *idx);
        if let Some((last, source)) = solved.last_mut() {
            if *source == winner {
                last.end = Some(to);
                continue;
            }
        }
        let frame = match winner {
            Some(idx) => RawTimeFrame {
                start: Some(from),
                end: Some(to),
                ..raw[idx].clone()
            },
            None => RawTimeFrame::between(from, to, false),
        };
        solved.push((frame, winner));
    }
    solved.into_iter().map(|(frame, _)| frame).collect()
}

/// Time of day in minutes, `00:00` through `24:00` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(24 * 60);

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        let total = hour.checked_mul(60)?.checked_add(minute)?;
        (minute < 60 && total <= 24 * 60).then_some(ClockTime(total))
    }

    pub fn on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::default()) + ChronoDuration::minutes(i64::from(self.0))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (hour, minute) = value
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid time (use hh:mm): {}", value))?;
        let hour: u32 = hour
            .parse()
            .map_err(|_| format!("invalid hour in {}", value))?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| format!("invalid minute in {}", value))?;
        ClockTime::new(hour, minute).ok_or_else(|| format!("time out of range: {}", value))
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl WorkingHours {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        WorkingHours { start, end }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Week {
    pub monday: Vec<WorkingHours>,
    pub tuesday: Vec<WorkingHours>,
    pub wednesday: Vec<WorkingHours>,
    pub thursday: Vec<WorkingHours>,
    pub friday: Vec<WorkingHours>,
    pub saturday: Vec<WorkingHours>,
    pub sunday: Vec<WorkingHours>,
}

impl Week {
    pub fn office_hours() -> Self {
        let day = match (ClockTime::new(9, 0), ClockTime::new(17, 0)) {
            (Some(start), Some(end)) => vec![WorkingHours::new(start, end)],
            _ => Vec::new(),
        };
        Week {
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day,
            saturday: Vec::new(),
            sunday: Vec::new(),
        }
    }

    pub fn hours(&self, weekday: Weekday) -> &[WorkingHours] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

/// Weekly working hours with per-date overrides (holidays, extra shifts).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WorkCalendar {
    pub week: Week,
    pub days: BTreeMap<NaiveDate, Vec<WorkingHours>>,
    pub magnet: bool,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        WorkCalendar {
            week: Week::office_hours(),
            days: BTreeMap::new(),
            magnet: true,
        }
    }
}

impl WorkCalendar {
    pub fn hours_on(&self, day: NaiveDate) -> &[WorkingHours] {
        match self.days.get(&day) {
            Some(hours) => hours,
            None => self.week.hours(day.weekday()),
        }
    }
}

impl Calendar for WorkCalendar {
    fn classify(&self, day: NaiveDate) -> Vec<RawTimeFrame> {
        let mut frames = vec![RawTimeFrame::new(false).with_magnet(self.magnet)];
        frames.extend(
            self.hours_on(day)
                .iter()
                .filter(|hours| hours.start < hours.end)
                .map(|hours| {
                    RawTimeFrame::between(hours.start.on(day), hours.end.on(day), true)
                        .with_magnet(self.magnet)
                        .with_priority(1)
                }),
        );
        frames
    }
}

#[cfg(test)]
#[path = "calendar_test.rs"]
mod tests;
