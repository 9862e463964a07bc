//! Layout of one time-axis column.
//!
//! A [`Column`] maps `[date, end_date)` onto the unit range `[left, left + width]`.
//! Its time frames come from a shared [`Calendar`], are clipped to the column,
//! receive proportional geometry, and are optionally cropped: frames of one
//! classification collapse to zero width and the rest are stretched to fill
//! the column.
//!
//! Derivation always builds a fresh layout and swaps it in, so a calendar
//! that breaks its contract leaves the previous layout untouched.

use crate::calendar::Calendar;
use crate::magnet::Magnet;
use crate::model::{ColumnError, FrameMode, RawTimeFrame, Size, TimeFrame};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
struct Layout {
    time_frames: Vec<TimeFrame>,
    visible: Vec<usize>,
    days: BTreeMap<NaiveDate, Range<usize>>,
    cropped: bool,
}

#[derive(Clone)]
pub struct Column {
    date: NaiveDateTime,
    end_date: NaiveDateTime,
    left: f64,
    width: f64,
    duration: i64,
    calendar: Option<Arc<dyn Calendar>>,
    working_mode: FrameMode,
    non_working_mode: FrameMode,
    original_size: Size,
    layout: Layout,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("date", &self.date)
            .field("end_date", &self.end_date)
            .field("left", &self.left)
            .field("width", &self.width)
            .field("working_mode", &self.working_mode)
            .field("non_working_mode", &self.non_working_mode)
            .field("time_frames", &self.layout.time_frames.len())
            .field("cropped", &self.layout.cropped)
            .finish_non_exhaustive()
    }
}

impl Column {
    pub fn new(
        date: NaiveDateTime,
        end_date: NaiveDateTime,
        left: f64,
        width: f64,
        calendar: Option<Arc<dyn Calendar>>,
        working_mode: FrameMode,
        non_working_mode: FrameMode,
    ) -> Result<Self, ColumnError> {
        if end_date <= date {
            return Err(ColumnError::InvalidRange {
                start: date,
                end: end_date,
            });
        }
        if !left.is_finite() || !width.is_finite() {
            return Err(ColumnError::NonFiniteGeometry { left, width });
        }
        if width < 0.0 {
            return Err(ColumnError::NegativeWidth(width));
        }
        let mut column = Column {
            date,
            end_date,
            left,
            width,
            duration: (end_date - date).num_milliseconds(),
            calendar,
            working_mode,
            non_working_mode,
            original_size: Size {
                left: Some(left),
                width,
            },
            layout: Layout::default(),
        };
        column.update_time_frames()?;
        Ok(column)
    }

    /// Same bounds and calendar with both frame modes reset to hidden.
    pub fn clone_bounds(&self) -> Result<Column, ColumnError> {
        Column::new(
            self.date,
            self.end_date,
            self.left,
            self.width,
            self.calendar.clone(),
            FrameMode::Hidden,
            FrameMode::Hidden,
        )
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn end_date(&self) -> NaiveDateTime {
        self.end_date
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration
    }

    pub fn working_mode(&self) -> FrameMode {
        self.working_mode
    }

    pub fn non_working_mode(&self) -> FrameMode {
        self.non_working_mode
    }

    pub fn original_size(&self) -> Size {
        self.original_size
    }

    /// True when every frame was collapsed by cropping.
    pub fn is_cropped(&self) -> bool {
        self.layout.cropped
    }

    pub fn time_frames(&self) -> &[TimeFrame] {
        &self.layout.time_frames
    }

    pub fn visible_time_frames(&self) -> impl Iterator<Item = &TimeFrame> + '_ {
        self.layout
            .visible
            .iter()
            .map(move |idx| &self.layout.time_frames[*idx])
    }

    /// Frames of one calendar day. `None` means the day was never derived.
    pub fn day_time_frames(&self, day: NaiveDate) -> Option<&[TimeFrame]> {
        self.layout
            .days
            .get(&day)
            .map(|range| &self.layout.time_frames[range.clone()])
    }

    /// The frame whose half-open interval holds `date`.
    pub fn time_frame_at(&self, date: NaiveDateTime) -> Option<&TimeFrame> {
        let frames = &self.layout.time_frames;
        let idx = frames.partition_point(|frame| frame.end <= date);
        frames.get(idx).filter(|frame| frame.contains(date))
    }

    pub fn crop_active(&self) -> bool {
        self.working_mode == FrameMode::Cropped || self.non_working_mode == FrameMode::Cropped
    }

    /// Half-open on the left: the column owns its end instant, not its start.
    pub fn contains_date(&self, date: NaiveDateTime) -> bool {
        date > self.date && date <= self.end_date
    }

    pub fn equals(&self, other: &Column) -> bool {
        self.date == other.date
    }

    pub fn set_modes(
        &mut self,
        working_mode: FrameMode,
        non_working_mode: FrameMode,
    ) -> Result<(), ColumnError> {
        let previous = (self.working_mode, self.non_working_mode);
        self.working_mode = working_mode;
        self.non_working_mode = non_working_mode;
        if let Err(err) = self.update_time_frames() {
            (self.working_mode, self.non_working_mode) = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Rebuilds every frame from the calendar. On error the previous layout stays.
    pub fn update_time_frames(&mut self) -> Result<(), ColumnError> {
        match self.derive_layout() {
            Ok(layout) => {
                debug!(
                    start = %self.date,
                    end = %self.end_date,
                    frames = layout.time_frames.len(),
                    visible = layout.visible.len(),
                    cropped = layout.cropped,
                    "derived column layout"
                );
                self.layout = layout;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, start = %self.date, "keeping previous column layout");
                Err(err)
            }
        }
    }

    fn derive_layout(&self) -> Result<Layout, ColumnError> {
        let Some(calendar) = &self.calendar else {
            return Ok(Layout::default());
        };

        let mut layout = Layout::default();
        let mut day_start = self.date.date().and_time(NaiveTime::default());
        while day_start < self.end_date {
            let day = day_start.date();
            let day_end = day_start + ChronoDuration::days(1);
            let resolved = calendar.resolve(calendar.classify(day), day_start, day_end);
            let accepted = accept_day(day, day_start, day_end, &resolved)?;

            let first = layout.time_frames.len();
            for mut frame in accepted {
                frame.start = frame.start.max(self.date);
                frame.end = frame.end.min(self.end_date);
                if frame.start < frame.end {
                    layout.time_frames.push(frame);
                }
            }
            layout.days.insert(day, first..layout.time_frames.len());
            day_start = day_end;
        }

        self.assign_geometry(&mut layout);
        if self.crop_active() && !layout.time_frames.is_empty() {
            layout.cropped = self.crop(&mut layout.time_frames);
        }
        Ok(layout)
    }

    fn assign_geometry(&self, layout: &mut Layout) {
        let duration = self.duration as f64;
        for (idx, frame) in layout.time_frames.iter_mut().enumerate() {
            let offset = (frame.start - self.date).num_milliseconds() as f64;
            let left = offset / duration * self.width;
            let width = frame.duration_ms() as f64 / duration * self.width;
            frame.hidden = frame.mode_in(self.working_mode, self.non_working_mode)
                != FrameMode::Visible;
            frame.left = Some(left);
            frame.width = width;
            frame.cropped = false;
            frame.original_size = Size {
                left: Some(left),
                width,
            };
            if !frame.hidden {
                layout.visible.push(idx);
            }
        }
    }

    /// Collapses the cropped classification and stretches the rest. Returns
    /// whether every frame ended up collapsed.
    fn crop(&self, frames: &mut [TimeFrame]) -> bool {
        let (working_mode, non_working_mode) = (self.working_mode, self.non_working_mode);
        let is_cropped =
            |frame: &TimeFrame| frame.mode_in(working_mode, non_working_mode) == FrameMode::Cropped;

        let expanded_width: f64 = frames
            .iter()
            .filter(|frame| !is_cropped(*frame))
            .map(|frame| frame.width)
            .sum();
        if approx_eq(expanded_width, self.width) {
            return false;
        }
        let ratio = (expanded_width > 0.0).then(|| self.width / expanded_width);

        let mut skipped_width = 0.0;
        let mut original_skipped_width = 0.0;
        let mut all_cropped = true;
        for frame in frames.iter_mut() {
            match ratio {
                Some(ratio) if !is_cropped(frame) => {
                    frame.left = frame.left.map(|left| (left - skipped_width) * ratio);
                    frame.width *= ratio;
                    frame.original_size = Size {
                        left: frame
                            .original_size
                            .left
                            .map(|left| (left - original_skipped_width) * ratio),
                        width: frame.original_size.width * ratio,
                    };
                    frame.cropped = false;
                    all_cropped = false;
                }
                _ => {
                    skipped_width += frame.width;
                    original_skipped_width += frame.original_size.width;
                    frame.left = None;
                    frame.width = 0.0;
                    frame.original_size = Size {
                        left: None,
                        width: 0.0,
                    };
                    frame.cropped = true;
                }
            }
        }
        debug!(expanded_width, ratio = ?ratio, all_cropped, "cropped column frames");
        all_cropped
    }

    /// Absolute position of `date` on the axis, `left` included.
    pub fn date_to_position(&self, date: NaiveDateTime) -> f64 {
        self.left + self.local_position(date)
    }

    /// Position of `date` relative to the column's own left edge, within `[0, width]`.
    pub fn local_position(&self, date: NaiveDateTime) -> f64 {
        let mut target = date;
        if self.crop_active() {
            match self.position_in_frames(date) {
                Ok(position) => return position,
                Err(advanced) => target = advanced,
            }
        }
        let offset = (target - self.date).num_milliseconds() as f64;
        (offset / self.duration as f64 * self.width).clamp(0.0, self.width)
    }

    /// Walks frames from `date`'s day onward. A collapsed frame pushes the
    /// target to the start of the following frame. When no expanded frame
    /// takes the target, the (possibly advanced) target is returned instead.
    fn position_in_frames(&self, date: NaiveDateTime) -> Result<f64, NaiveDateTime> {
        let Some(range) = self.layout.days.get(&date.date()) else {
            return Err(date);
        };
        let frames = &self.layout.time_frames[range.start..];
        let mut target = date;
        for (idx, frame) in frames.iter().enumerate() {
            if frame.start > target {
                break;
            }
            if !frame.covers(target) {
                continue;
            }
            if frame.cropped {
                target = frames.get(idx + 1).map_or(frame.end, |next| next.start);
                continue;
            }
            if let Some(left) = frame.left {
                let offset = (target - frame.start).num_milliseconds() as f64;
                return Ok(left + offset / frame.duration_ms() as f64 * frame.width);
            }
        }
        Err(target)
    }

    /// Date under a column-relative `position`, clamped to the column and
    /// passed through `magnet`.
    pub fn position_to_date(&self, position: f64, magnet: &Magnet) -> NaiveDateTime {
        let position = position.clamp(0.0, self.width);
        let date = if self.crop_active() {
            self.date_in_frames(position)
        } else {
            None
        };
        let date = date.unwrap_or_else(|| self.affine_date(position));
        self.resolve_magnet(date, magnet)
    }

    fn date_in_frames(&self, position: f64) -> Option<NaiveDateTime> {
        self.layout.time_frames.iter().find_map(|frame| {
            let left = frame.left?;
            if frame.cropped || frame.width <= 0.0 {
                return None;
            }
            if position < left || position > left + frame.width {
                return None;
            }
            let offset = frame.duration_ms() as f64 / frame.width * (position - left);
            Some(shift(frame.start, offset))
        })
    }

    fn affine_date(&self, position: f64) -> NaiveDateTime {
        if self.width <= 0.0 {
            return self.date;
        }
        shift(self.date, self.duration as f64 / self.width * position)
    }
}

/// Checks a resolved day against the calendar contract and turns it into
/// column-owned frames with concrete edges.
fn accept_day(
    day: NaiveDate,
    day_start: NaiveDateTime,
    day_end: NaiveDateTime,
    resolved: &[RawTimeFrame],
) -> Result<Vec<TimeFrame>, ColumnError> {
    let violation = |reason: String| ColumnError::CalendarContract { day, reason };
    if resolved.is_empty() {
        return Err(violation("no intervals returned".into()));
    }

    let mut frames = Vec::with_capacity(resolved.len());
    let mut cursor = day_start;
    for raw in resolved {
        let start = raw.start.unwrap_or(day_start);
        let end = raw.end.unwrap_or(day_end);
        if end < start {
            return Err(violation(format!("interval {} ends before it starts", start)));
        }
        if start < cursor {
            return Err(violation(format!("interval at {} overlaps or is out of order", start)));
        }
        if start > cursor {
            return Err(violation(format!("gap between {} and {}", cursor, start)));
        }
        frames.push(TimeFrame::new(start, end, raw.working, raw.magnet));
        cursor = end;
    }
    if cursor != day_end {
        return Err(violation(format!("coverage ends at {} instead of {}", cursor, day_end)));
    }
    Ok(frames)
}

fn shift(date: NaiveDateTime, millis: f64) -> NaiveDateTime {
    date + ChronoDuration::milliseconds(millis.round() as i64)
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[cfg(test)]
#[path = "column_test.rs"]
mod tests;
