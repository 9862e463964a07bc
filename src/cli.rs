use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ganttcol",
    version,
    about = "Lay out a schedule column over working and non-working time"
)]
pub struct Cli {
    /// Config file (defaults to .ganttcol/config.yml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SpanArgs {
    /// Column start in YYYY-MM-DDThh:mm format (defaults to today 00:00)
    #[arg(long)]
    pub from: Option<String>,
    /// Column end, exclusive (defaults to one day after --from)
    #[arg(long)]
    pub to: Option<String>,
    /// Column width in axis units
    #[arg(long)]
    pub width: Option<f64>,
    /// Column left edge in axis units
    #[arg(long)]
    pub left: Option<f64>,
    /// Working frame mode: visible, hidden or cropped
    #[arg(long)]
    pub working: Option<String>,
    /// Non-working frame mode: visible, hidden or cropped
    #[arg(long = "non-working")]
    pub non_working: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct MagnetArgs {
    /// Snap to multiples of this many units
    #[arg(long)]
    pub magnet: Option<u32>,
    /// Snap unit: millisecond, second, minute, hour, day, month, year or column
    #[arg(long)]
    pub unit: Option<String>,
    /// Also snap to working/non-working boundaries
    #[arg(long)]
    pub frames: bool,
    /// Tie policy: nearest, up or down
    #[arg(long)]
    pub midpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the time frames of a column
    Layout {
        #[command(flatten)]
        span: SpanArgs,
        /// Dump the layout as YAML
        #[arg(long)]
        yaml: bool,
    },
    /// Convert a date to an axis position
    Position {
        #[command(flatten)]
        span: SpanArgs,
        /// Date in YYYY-MM-DDThh:mm format
        date: String,
    },
    /// Convert a column-relative position to a date
    Date {
        #[command(flatten)]
        span: SpanArgs,
        #[command(flatten)]
        magnet: MagnetArgs,
        /// Position relative to the column's left edge
        #[arg(allow_hyphen_values = true)]
        position: f64,
    },
    /// Launch the interactive column preview
    Preview {
        #[command(flatten)]
        span: SpanArgs,
    },
}
