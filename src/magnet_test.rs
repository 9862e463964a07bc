use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::{round_to, Magnet, MagnetUnit, Midpoint};
use crate::calendar::{Calendar, ClockTime, WorkCalendar, WorkingHours};
use crate::column::Column;
use crate::model::{FrameMode, RawTimeFrame};

fn ymd_hms_ms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_milli_opt(h, min, s, ms))
        .expect("valid test date")
}

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    ymd_hms_ms(2024, 1, day, hour, minute, 0, 0)
}

/// Working day with a non-working lunch from 12:00 to 14:00.
struct Lunch {
    magnet: bool,
}

impl Calendar for Lunch {
    fn classify(&self, day: NaiveDate) -> Vec<RawTimeFrame> {
        let noon = day.and_hms_opt(12, 0, 0).expect("noon");
        let two = day.and_hms_opt(14, 0, 0).expect("two");
        vec![
            RawTimeFrame::new(true).with_magnet(self.magnet),
            RawTimeFrame::between(noon, two, false)
                .with_magnet(self.magnet)
                .with_priority(1),
        ]
    }
}

fn column_with(calendar: Option<Arc<dyn Calendar>>, left: f64) -> Column {
    Column::new(
        at(1, 0, 0),
        at(2, 0, 0),
        left,
        100.0,
        calendar,
        FrameMode::Visible,
        FrameMode::Visible,
    )
    .expect("valid column")
}

fn lunch_column(magnet: bool) -> Column {
    column_with(Some(Arc::new(Lunch { magnet })), 0.0)
}

#[test]
fn disabled_magnet_is_identity() {
    let column = lunch_column(true);
    let date = ymd_hms_ms(2024, 1, 1, 10, 7, 31, 123);
    assert_eq!(column.resolve_magnet(date, &Magnet::NONE), date);
    let zero = Magnet::new(0, MagnetUnit::Hour).with_time_frames(true);
    assert_eq!(column.resolve_magnet(date, &zero), date);
    let no_unit = Magnet {
        value: 5,
        ..Magnet::NONE
    };
    assert_eq!(column.resolve_magnet(date, &no_unit), date);
    assert!(!no_unit.is_active());
}

#[test]
fn column_mode_snaps_to_nearer_edge() {
    for left in [0.0, 200.0] {
        let column = column_with(None, left);
        let magnet = Magnet::new(1, MagnetUnit::Column);
        assert_eq!(column.resolve_magnet(at(1, 11, 59), &magnet), at(1, 0, 0));
        assert_eq!(column.resolve_magnet(at(1, 12, 0), &magnet), at(2, 0, 0));
        assert_eq!(column.resolve_magnet(at(1, 23, 0), &magnet), at(2, 0, 0));
    }
}

#[test]
fn rounds_sub_day_units() {
    let quarter = |h, m, s, policy| {
        round_to(ymd_hms_ms(2024, 1, 1, h, m, s, 0), MagnetUnit::Minute, 15, policy)
    };
    assert_eq!(quarter(10, 7, 29, Midpoint::Nearest), at(1, 10, 0));
    assert_eq!(quarter(10, 7, 30, Midpoint::Nearest), at(1, 10, 15));
    assert_eq!(quarter(10, 0, 0, Midpoint::Up), at(1, 10, 0));
    assert_eq!(quarter(10, 0, 1, Midpoint::Up), at(1, 10, 15));
    assert_eq!(quarter(10, 14, 59, Midpoint::Down), at(1, 10, 0));
    assert_eq!(quarter(10, 53, 0, Midpoint::Nearest), at(1, 11, 0));

    assert_eq!(
        round_to(at(1, 10, 40), MagnetUnit::Hour, 1, Midpoint::Nearest),
        at(1, 11, 0)
    );
    assert_eq!(
        round_to(at(1, 23, 50), MagnetUnit::Hour, 1, Midpoint::Nearest),
        at(2, 0, 0)
    );
    assert_eq!(
        round_to(
            ymd_hms_ms(2024, 1, 1, 10, 0, 0, 600),
            MagnetUnit::Second,
            1,
            Midpoint::Nearest
        ),
        ymd_hms_ms(2024, 1, 1, 10, 0, 1, 0)
    );
    assert_eq!(
        round_to(
            ymd_hms_ms(2024, 1, 1, 10, 0, 0, 600),
            MagnetUnit::Millisecond,
            250,
            Midpoint::Nearest
        ),
        ymd_hms_ms(2024, 1, 1, 10, 0, 0, 500)
    );
}

#[test]
fn rounds_calendar_units() {
    assert_eq!(
        round_to(at(15, 13, 0), MagnetUnit::Day, 1, Midpoint::Nearest),
        at(16, 0, 0)
    );
    assert_eq!(
        round_to(at(15, 11, 0), MagnetUnit::Day, 1, Midpoint::Nearest),
        at(15, 0, 0)
    );
    assert_eq!(
        round_to(at(20, 0, 0), MagnetUnit::Day, 7, Midpoint::Down),
        at(14, 0, 0)
    );
    assert_eq!(
        round_to(
            ymd_hms_ms(2024, 2, 20, 0, 0, 0, 0),
            MagnetUnit::Month,
            1,
            Midpoint::Nearest
        ),
        ymd_hms_ms(2024, 3, 1, 0, 0, 0, 0)
    );
    assert_eq!(
        round_to(
            ymd_hms_ms(2024, 5, 10, 0, 0, 0, 0),
            MagnetUnit::Month,
            3,
            Midpoint::Down
        ),
        ymd_hms_ms(2024, 4, 1, 0, 0, 0, 0)
    );
    assert_eq!(
        round_to(
            ymd_hms_ms(2024, 8, 1, 0, 0, 0, 0),
            MagnetUnit::Year,
            1,
            Midpoint::Nearest
        ),
        ymd_hms_ms(2025, 1, 1, 0, 0, 0, 0)
    );
}

#[test]
fn rounding_is_clamped_into_the_column() {
    let column = Column::new(
        at(1, 9, 0),
        at(1, 17, 0),
        0.0,
        100.0,
        None,
        FrameMode::Visible,
        FrameMode::Visible,
    )
    .expect("valid column");
    let nearest_day = Magnet::new(1, MagnetUnit::Day);
    assert_eq!(column.resolve_magnet(at(1, 13, 0), &nearest_day), at(1, 17, 0));
    let floor_day = nearest_day.with_midpoint(Midpoint::Down);
    assert_eq!(column.resolve_magnet(at(1, 10, 0), &floor_day), at(1, 9, 0));
}

#[test]
fn position_to_date_applies_magnet() {
    let column = column_with(None, 0.0);
    let magnet = Magnet::new(15, MagnetUnit::Minute);
    // 25.1 units is 06:01:26.4
    assert_eq!(column.position_to_date(25.1, &magnet), at(1, 6, 0));
    assert_eq!(
        column.position_to_date(25.1, &Magnet::NONE),
        ymd_hms_ms(2024, 1, 1, 6, 1, 26, 400)
    );
}

#[test]
fn frame_boundary_beats_coarser_rounding() {
    let column = lunch_column(true);
    let magnet = Magnet::new(1, MagnetUnit::Day).with_time_frames(true);
    assert_eq!(column.resolve_magnet(at(1, 11, 50), &magnet), at(1, 12, 0));
    // 12:00 and 14:00 are equally close; the first one scanned wins.
    assert_eq!(column.resolve_magnet(at(1, 13, 0), &magnet), at(1, 12, 0));
    assert_eq!(column.resolve_magnet(at(1, 13, 1), &magnet), at(1, 14, 0));
}

#[test]
fn frame_boundary_must_be_strictly_closer() {
    let column = lunch_column(true);
    let magnet = Magnet::new(1, MagnetUnit::Minute).with_time_frames(true);
    assert_eq!(column.resolve_magnet(at(1, 13, 0), &magnet), at(1, 13, 0));
    let hourly = Magnet::new(1, MagnetUnit::Hour).with_time_frames(true);
    assert_eq!(column.resolve_magnet(at(1, 11, 50), &hourly), at(1, 12, 0));
}

#[test]
fn frames_without_magnet_are_ignored() {
    let column = lunch_column(false);
    let magnet = Magnet::new(1, MagnetUnit::Day).with_time_frames(true);
    assert_eq!(column.resolve_magnet(at(1, 11, 50), &magnet), at(1, 0, 0));
    assert_eq!(column.resolve_magnet(at(1, 13, 0), &magnet), at(2, 0, 0));
}

#[test]
fn boundaries_between_same_class_frames_are_skipped() {
    let clock = |h| ClockTime::new(h, 0).expect("valid");
    let mut calendar = WorkCalendar::default();
    calendar.week.monday = vec![
        WorkingHours::new(clock(9), clock(12)),
        WorkingHours::new(clock(12), clock(17)),
    ];
    let column = column_with(Some(Arc::new(calendar)), 0.0);
    assert_eq!(column.time_frames().len(), 4);
    let magnet = Magnet::new(1, MagnetUnit::Day).with_time_frames(true);
    assert_eq!(column.resolve_magnet(at(1, 12, 10), &magnet), at(1, 9, 0));
}

#[test]
fn parses_units_and_policies() {
    assert_eq!("hours".parse::<MagnetUnit>().ok(), Some(MagnetUnit::Hour));
    assert_eq!("ms".parse::<MagnetUnit>().ok(), Some(MagnetUnit::Millisecond));
    assert_eq!("date".parse::<MagnetUnit>().ok(), Some(MagnetUnit::Day));
    assert_eq!(" Column ".parse::<MagnetUnit>().ok(), Some(MagnetUnit::Column));
    assert!("week".parse::<MagnetUnit>().is_err());
    assert_eq!("up".parse::<Midpoint>(), Ok(Midpoint::Up));
    assert!("sideways".parse::<Midpoint>().is_err());
    assert_eq!(MagnetUnit::Year.next(), MagnetUnit::Column);
    assert_eq!(MagnetUnit::Column.next(), MagnetUnit::Millisecond);
}

#[test]
fn magnet_deserializes_with_defaults() {
    let magnet: Magnet =
        serde_yaml::from_str("value: 15\nunit: minute\ntime_frames: true\n").expect("yaml");
    assert_eq!(
        magnet,
        Magnet::new(15, MagnetUnit::Minute).with_time_frames(true)
    );
    let day: Magnet = serde_yaml::from_str("value: 1\nunit: date\nmidpoint: up\n").expect("yaml");
    assert_eq!(day.unit, Some(MagnetUnit::Day));
    assert_eq!(day.midpoint, Midpoint::Up);
    let empty: Magnet = serde_yaml::from_str("{}").expect("yaml");
    assert!(!empty.is_active());
}
