mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Preview {
        span: cli::SpanArgs::default(),
    });
    match command {
        cli::Command::Layout { span, yaml } => commands::layout(args.config, span, yaml),
        cli::Command::Position { span, date } => commands::position(args.config, span, date),
        cli::Command::Date {
            span,
            magnet,
            position,
        } => commands::date(args.config, span, magnet, position),
        cli::Command::Preview { span } => commands::preview(args.config, span),
    }
}
