use crate::cli::{MagnetArgs, SpanArgs};
use crate::ui;
use anyhow::{anyhow, Context, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use ganttcol::config::{load_config, locate_config, Config, ConfigLocation};
use ganttcol::{Column, FrameMode, Magnet, MagnetUnit, Midpoint, TimeFrame};
use serde::Serialize;
use std::env;
use std::path::PathBuf;

const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Serialize)]
struct LayoutReport<'a> {
    start: NaiveDateTime,
    end: NaiveDateTime,
    left: f64,
    width: f64,
    working_mode: FrameMode,
    non_working_mode: FrameMode,
    cropped: bool,
    time_frames: &'a [TimeFrame],
}

pub fn layout(config: Option<PathBuf>, span: SpanArgs, yaml: bool) -> Result<()> {
    let (column, _, location) = load_column(config, &span)?;
    if yaml {
        let report = LayoutReport {
            start: column.date(),
            end: column.end_date(),
            left: column.left(),
            width: column.width(),
            working_mode: column.working_mode(),
            non_working_mode: column.non_working_mode(),
            cropped: column.is_cropped(),
            time_frames: column.time_frames(),
        };
        let serialized = serde_yaml::to_string(&report).context("serializing layout")?;
        print!("{}", serialized);
        return Ok(());
    }

    println!(
        "Column {} -> {} at [{}, {}] (config: {})",
        format_date(&column.date()),
        format_date(&column.end_date()),
        column.left(),
        column.left() + column.width(),
        location.describe()
    );
    println!(
        "  working {}, non-working {}{}",
        column.working_mode(),
        column.non_working_mode(),
        if column.is_cropped() {
            "  (fully cropped)"
        } else {
            ""
        }
    );
    let mut day = None;
    for frame in column.time_frames() {
        if day != Some(frame.start.date()) {
            day = Some(frame.start.date());
            println!("{}", frame.start.format("%a %Y-%m-%d"));
        }
        print_frame(frame);
    }
    if column.time_frames().is_empty() {
        println!("  (no time frames)");
    }
    Ok(())
}

pub fn position(config: Option<PathBuf>, span: SpanArgs, date: String) -> Result<()> {
    let (column, _, _) = load_column(config, &span)?;
    let date = parse_date(&date)?;
    println!("{:.3}", column.date_to_position(date));
    Ok(())
}

pub fn date(
    config: Option<PathBuf>,
    span: SpanArgs,
    magnet_args: MagnetArgs,
    position: f64,
) -> Result<()> {
    let (column, config, _) = load_column(config, &span)?;
    let magnet = merge_magnet(config.magnet, &magnet_args)?;
    println!("{}", format_date(&column.position_to_date(position, &magnet)));
    Ok(())
}

pub fn preview(config: Option<PathBuf>, span: SpanArgs) -> Result<()> {
    let (column, config, location) = load_column(config, &span)?;
    ui::run(column, config.magnet, location)
}

fn load_column(
    config_path: Option<PathBuf>,
    span: &SpanArgs,
) -> Result<(Column, Config, ConfigLocation)> {
    let cwd = env::current_dir()?;
    let location = locate_config(config_path.as_deref(), &cwd);
    let mut config = load_config(&location)?;
    apply_span_overrides(&mut config, span)?;
    let (start, end) = resolve_span(span)?;
    let column = config
        .build_column(start, end)
        .with_context(|| format!("building column {} -> {}", start, end))?;
    tracing::debug!(
        config = %location.describe(),
        frames = column.time_frames().len(),
        "column ready"
    );
    Ok((column, config, location))
}

fn apply_span_overrides(config: &mut Config, span: &SpanArgs) -> Result<()> {
    if let Some(width) = span.width {
        config.column.width = width;
    }
    if let Some(left) = span.left {
        config.column.left = left;
    }
    if let Some(mode) = span.working.as_deref() {
        config.column.working_mode = mode.parse()?;
    }
    if let Some(mode) = span.non_working.as_deref() {
        config.column.non_working_mode = mode.parse()?;
    }
    Ok(())
}

fn resolve_span(span: &SpanArgs) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start = match span.from.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive().and_time(NaiveTime::default()),
    };
    let end = match span.to.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => start + ChronoDuration::days(1),
    };
    Ok((start, end))
}

fn merge_magnet(base: Magnet, args: &MagnetArgs) -> Result<Magnet> {
    let mut magnet = base;
    if let Some(value) = args.magnet {
        magnet.value = value;
    }
    if let Some(unit) = args.unit.as_deref() {
        magnet.unit = Some(unit.parse::<MagnetUnit>()?);
    }
    if args.frames {
        magnet.time_frames = true;
    }
    if let Some(midpoint) = args.midpoint.as_deref() {
        magnet.midpoint = midpoint.parse::<Midpoint>().map_err(|e| anyhow!(e))?;
    }
    Ok(magnet)
}

fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let raw = input.trim();
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|day| day.and_time(NaiveTime::default()))
        .map_err(|_| anyhow!("invalid date format (use YYYY-MM-DDThh:mm): {}", raw))
}

fn format_date(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

fn print_frame(frame: &TimeFrame) {
    let class = if frame.working { "working" } else { "off" };
    let geometry = match frame.left {
        Some(left) => format!("[{:>8.3} +{:>8.3}]", left, frame.width),
        None => format!("[{:>8} +{:>8.3}]", "-", frame.width),
    };
    let mut flags = Vec::new();
    if frame.hidden {
        flags.push("hidden");
    }
    if frame.cropped {
        flags.push("cropped");
    }
    if frame.magnet {
        flags.push("magnet");
    }
    println!(
        "  {}-{} {:<7} {} {}",
        frame.start.format("%H:%M"),
        frame.end.format("%H:%M"),
        class,
        geometry,
        flags.join(",")
    );
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
