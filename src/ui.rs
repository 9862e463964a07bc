use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ganttcol::config::ConfigLocation;
use ganttcol::{Column, Magnet, MagnetUnit, TimeFrame};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;

pub fn run(column: Column, magnet: Magnet, location: ConfigLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(column, magnet, location);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    column: Column,
    magnet: Magnet,
    location: ConfigLocation,
    cursor: usize,
    cells: usize,
    status: String,
}

impl App {
    fn new(column: Column, magnet: Magnet, location: ConfigLocation) -> Self {
        let status = format!("Loaded config from {}", location.describe());
        App {
            column,
            magnet,
            location,
            cursor: 0,
            cells: 1,
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left | KeyCode::Char('h') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor = (self.cursor + 1).min(self.cells.saturating_sub(1));
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.cells.saturating_sub(1),
            KeyCode::Char('w') => self.cycle_modes(true),
            KeyCode::Char('n') => self.cycle_modes(false),
            KeyCode::Char('f') => {
                self.magnet.time_frames = !self.magnet.time_frames;
                self.status = format!(
                    "Frame magnet {}",
                    if self.magnet.time_frames { "on" } else { "off" }
                );
            }
            KeyCode::Char('u') => {
                let unit = self.magnet.unit.map_or(MagnetUnit::Minute, MagnetUnit::next);
                self.magnet.unit = Some(unit);
                self.magnet.value = self.magnet.value.max(1);
                self.status = format!("Magnet {}", describe_magnet(&self.magnet));
            }
            KeyCode::Char('+') => {
                self.magnet.value = self.magnet.value.saturating_add(1);
                self.status = format!("Magnet {}", describe_magnet(&self.magnet));
            }
            KeyCode::Char('-') => {
                self.magnet.value = self.magnet.value.saturating_sub(1);
                self.status = format!("Magnet {}", describe_magnet(&self.magnet));
            }
            _ => {}
        }
        false
    }

    fn cycle_modes(&mut self, working: bool) {
        let (mut working_mode, mut non_working_mode) =
            (self.column.working_mode(), self.column.non_working_mode());
        if working {
            working_mode = working_mode.next();
        } else {
            non_working_mode = non_working_mode.next();
        }
        self.status = match self.column.set_modes(working_mode, non_working_mode) {
            Ok(()) => format!(
                "Working {}, non-working {}",
                working_mode, non_working_mode
            ),
            Err(err) => format!("Kept previous layout: {}", err),
        };
    }

    fn cursor_position(&self) -> f64 {
        (self.cursor as f64 + 0.5) / self.cells.max(1) as f64 * self.column.width()
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(4),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_track(f, layout[1]);
        self.draw_frames(f, layout[2]);
        self.draw_footer(f, layout[3]);
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "ganttcol ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "{} → {}",
                    self.column.date().format("%Y-%m-%d %H:%M"),
                    self.column.end_date().format("%Y-%m-%d %H:%M")
                ),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("working {}", self.column.working_mode()),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("non-working {}", self.column.non_working_mode()),
                Style::default().fg(Color::Magenta),
            ),
            Span::raw("  •  "),
            Span::styled(self.location.describe(), Style::default().fg(Color::DarkGray)),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_track(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.cells = area.width.saturating_sub(2).max(1) as usize;
        self.cursor = self.cursor.min(self.cells - 1);

        let mut cells = Vec::with_capacity(self.cells);
        let mut marker = Vec::with_capacity(self.cells);
        for idx in 0..self.cells {
            let position = (idx as f64 + 0.5) / self.cells as f64 * self.column.width();
            let date = self.column.position_to_date(position, &Magnet::NONE);
            let (symbol, mut style) = cell_look(self.column.time_frame_at(date));
            if idx == self.cursor {
                style = style.bg(Color::Yellow);
            }
            cells.push(Span::styled(symbol, style));
            marker.push(if idx == self.cursor { "^" } else { " " });
        }

        let start_label = self.column.date().format("%H:%M").to_string();
        let end_label = self.column.end_date().format("%H:%M").to_string();
        let gap = self
            .cells
            .saturating_sub(start_label.len() + end_label.len());
        let lines = vec![
            Line::from(cells),
            Line::styled(marker.concat(), Style::default().fg(Color::Yellow)),
            Line::styled(
                format!("{}{}{}", start_label, " ".repeat(gap), end_label),
                Style::default().fg(Color::Gray),
            ),
        ];
        let title = if self.column.is_cropped() {
            "Column (fully cropped)"
        } else {
            "Column"
        };
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_frames(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let raw = self
            .column
            .position_to_date(self.cursor_position(), &Magnet::NONE);
        let items: Vec<ListItem> = if self.column.time_frames().is_empty() {
            vec![ListItem::new("No time frames")]
        } else {
            self.column
                .time_frames()
                .iter()
                .map(|frame| frame_item(frame, frame.contains(raw)))
                .collect()
        };
        let block = Block::default()
            .title(Span::styled(
                format!(
                    "Time frames ({}, {} visible)",
                    self.column.time_frames().len(),
                    self.column.visible_time_frames().count()
                ),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(List::new(items).block(block), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help = Line::from(vec![
            Span::styled("←/→", Style::default().fg(Color::LightCyan)),
            Span::raw(" move  "),
            Span::styled("w", Style::default().fg(Color::LightCyan)),
            Span::raw(" working mode  "),
            Span::styled("n", Style::default().fg(Color::LightCyan)),
            Span::raw(" non-working mode  "),
            Span::styled("u", Style::default().fg(Color::LightCyan)),
            Span::raw(" unit  "),
            Span::styled("+/-", Style::default().fg(Color::LightCyan)),
            Span::raw(" value  "),
            Span::styled("f", Style::default().fg(Color::LightCyan)),
            Span::raw(" frame magnet  "),
            Span::styled("q", Style::default().fg(Color::LightCyan)),
            Span::raw(" quit"),
        ]);
        let help_bar = Paragraph::new(help).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let position = self.cursor_position();
        let raw = self.column.position_to_date(position, &Magnet::NONE);
        let snapped = self.column.position_to_date(position, &self.magnet);
        let detail = Line::from(vec![
            Span::styled(
                format!("{:.2}", self.column.left() + position),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::raw(raw.format("%Y-%m-%d %H:%M:%S").to_string()),
            Span::raw("  ⇒  "),
            Span::styled(
                snapped.format("%Y-%m-%d %H:%M:%S").to_string(),
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let detail = Paragraph::new(detail).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!("magnet {}", describe_magnet(&self.magnet))),
        );
        f.render_widget(detail, bottom[1]);
    }
}

fn cell_look(frame: Option<&TimeFrame>) -> (&'static str, Style) {
    match frame {
        None => ("·", Style::default().fg(Color::DarkGray)),
        Some(frame) if frame.hidden => (" ", Style::default()),
        Some(frame) if frame.working => ("█", Style::default().fg(Color::Green)),
        Some(_) => ("▒", Style::default().fg(Color::Gray)),
    }
}

fn frame_item(frame: &TimeFrame, selected: bool) -> ListItem<'static> {
    let geometry = match frame.left {
        Some(left) => format!("{:>8.2} +{:>7.2}", left, frame.width),
        None => format!("{:>8} +{:>7.2}", "-", frame.width),
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
    let line = Line::from(vec![
        Span::styled(
            format!(
                "{} {}-{} ",
                frame.start.format("%a %d"),
                frame.start.format("%H:%M"),
                frame.end.format("%H:%M")
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:<8}", if frame.working { "working" } else { "off" }),
            Style::default().fg(if frame.working {
                Color::Green
            } else {
                Color::Gray
            }),
        ),
        Span::raw(geometry),
        Span::styled(
            format!("  {}", flags.join(",")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let mut item = ListItem::new(line);
    if selected {
        item = item.style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    }
    item
}

fn describe_magnet(magnet: &Magnet) -> String {
    match magnet.unit {
        Some(unit) if magnet.value > 0 => format!(
            "{} {}{}",
            magnet.value,
            unit,
            if magnet.time_frames { " + frames" } else { "" }
        ),
        _ => format!(
            "off{}",
            if magnet.time_frames { " (frames armed)" } else { "" }
        ),
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
