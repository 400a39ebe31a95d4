use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::domain::task::Task;
use crate::store::{Readiness, TaskStore};

pub fn run<S: TaskStore>(mut app: App<S>, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last_tick = Instant::now();
    let res = loop {
        app.poll_store();
        terminal.draw(|f| draw(f, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && handle_key(&mut app, key.code)?
        {
            break Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    };

    cleanup_terminal(&mut terminal)?;
    res
}

fn handle_key<S: TaskStore>(app: &mut App<S>, code: KeyCode) -> Result<bool> {
    match app.mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
            KeyCode::Char('a') | KeyCode::Char('n') => {
                app.mode = InputMode::Editing;
                app.input.clear();
                app.set_status("Type new task and press Enter");
            }
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            KeyCode::Char('r') => app.refresh(),
            _ => {}
        },
        InputMode::Editing => match code {
            KeyCode::Esc => {
                app.mode = InputMode::Normal;
                app.input.clear();
                app.set_status("Canceled");
            }
            KeyCode::Enter => app.add_task(),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) => app.input.push(c),
            _ => {}
        },
    }

    Ok(false)
}

fn draw<S: TaskStore>(f: &mut ratatui::Frame, app: &App<S>) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(size);

    let header = render_header(app);
    f.render_widget(header, chunks[0]);

    match app.readiness() {
        Readiness::Loading => {
            let notice = Paragraph::new("⏳ Loading tasks from the backend...")
                .block(Block::default().title("Tasks").borders(Borders::ALL));
            f.render_widget(notice, chunks[1]);
        }
        Readiness::Failed => {
            let notice = Paragraph::new("⚠ Could not load tasks; press r to retry, q to quit")
                .style(Style::default().fg(Color::Red))
                .block(Block::default().title("Tasks").borders(Borders::ALL));
            f.render_widget(notice, chunks[1]);
        }
        Readiness::Ready => draw_sections(f, app, chunks[1]),
    }

    let footer = render_footer(app);
    f.render_widget(footer, chunks[2]);
}

fn draw_sections<S: TaskStore>(f: &mut ratatui::Frame, app: &App<S>, area: ratatui::layout::Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (open_cursor, done_cursor) = if app.is_empty() {
        (None, None)
    } else if app.selected < app.incomplete.len() {
        (Some(app.selected), None)
    } else {
        (None, Some(app.selected - app.incomplete.len()))
    };

    let mut open_state = ListState::default();
    open_state.select(open_cursor);
    let open = render_section(
        &app.incomplete,
        open_cursor,
        "Incomplete (j/k move ; a add ; Space/Enter toggle ; d delete)",
        "🎉 No pending tasks",
    );
    f.render_stateful_widget(open, halves[0], &mut open_state);

    let mut done_state = ListState::default();
    done_state.select(done_cursor);
    let done = render_section(
        &app.completed,
        done_cursor,
        "Completed",
        "📝 No completed tasks yet",
    );
    f.render_stateful_widget(done, halves[1], &mut done_state);
}

fn render_section<'a>(
    tasks: &'a [Task],
    cursor: Option<usize>,
    title: &'a str,
    empty_hint: &'a str,
) -> List<'a> {
    let items: Vec<ListItem> = if tasks.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            format!(" {empty_hint}"),
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let symbol = if task.completed { "✔" } else { "•" };
                let line = Line::from(Span::raw(format!(" {symbol} {}", task.text)));

                let style = if cursor == Some(idx) {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if task.completed {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };

                ListItem::new(line).style(style)
            })
            .collect()
    };

    List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_symbol("➤ ")
}

fn render_header<S: TaskStore>(app: &App<S>) -> Paragraph<'static> {
    let total = app.len();
    let open = app.incomplete.len();
    let summary = format!("Open: {open} / All: {total}");
    let mut spans = vec![
        Span::styled("tana - tasks", Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
        Span::styled(summary, Style::default().fg(Color::Yellow)),
    ];
    if app.readiness() == Readiness::Loading {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            "⏳ Loading...",
            Style::default().fg(Color::Magenta),
        ));
    }
    let line = Line::from(spans);
    Paragraph::new(line)
        .block(Block::default().title("Overview").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_footer<S: TaskStore>(app: &App<S>) -> Paragraph<'_> {
    match app.mode {
        InputMode::Normal => {
            let msg = app
                .status
                .as_deref()
                .unwrap_or("q quit ; a add ; r reload");
            Paragraph::new(msg).block(Block::default().title("Normal").borders(Borders::ALL))
        }
        InputMode::Editing => {
            let line = Line::from(vec![
                Span::raw("New task: "),
                Span::styled(&app.input, Style::default().fg(Color::Yellow)),
                Span::raw("█"),
            ]);
            Paragraph::new(line).block(
                Block::default()
                    .title("Input (Enter to add / Esc to cancel)")
                    .borders(Borders::ALL),
            )
        }
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
