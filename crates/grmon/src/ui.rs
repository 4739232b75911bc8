use crate::state::{App, Overlay};
use crate::theme;
use grmon_core::{Frame as StackFrame, Task};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Chart, Clear, Dataset, GraphType, List, ListItem,
        Paragraph, Wrap,
    },
    Frame,
};

const FOOTER_KEYS: &str = "F1 Help | F2 Pause | F10 Quit";

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.size();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[0]);
    let status = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(5, 8), Constraint::Ratio(3, 8)])
        .split(top[0]);
    render_status_bars(f, app, status[0]);
    render_status_legend(f, app, status[1]);
    render_history(f, app, top[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 6), Constraint::Ratio(5, 6)])
        .split(rows[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(bottom[0]);
    render_filter(f, app, left[0]);
    render_list(f, app, left[1]);
    render_details(f, app, bottom[1]);
    render_footer(f, app, rows[2]);

    match app.overlay {
        Some(Overlay::Help) => render_help(f, area),
        Some(Overlay::Paused) => render_paused(f, area),
        None => {}
    }
}

fn block(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::BORDER_STYLE)
        .title(Span::styled(title.into(), theme::TITLE_STYLE))
}

fn render_status_bars(f: &mut Frame, app: &App, area: Rect) {
    let bars = app.engine.histogram().bars();
    let chart = BarChart::default()
        .block(block("Status"))
        .data(bars.as_slice())
        .bar_width(3)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(theme::SELECTED_STYLE)
        .label_style(Style::default().fg(theme::TEXT));
    f.render_widget(chart, area);
}

fn render_status_legend(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .engine
        .histogram()
        .entries()
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(format!("{}: ", entry.label), theme::EMPHASIS_STYLE),
                Span::styled(
                    entry.status.clone(),
                    Style::default().fg(theme::status_color(&entry.status)),
                ),
                Span::raw(format!(" ({})", entry.count)),
            ])
        })
        .collect();
    let legend = Paragraph::new(lines)
        .block(block("Legend"))
        .wrap(Wrap { trim: true });
    f.render_widget(legend, area);
}

fn render_history(f: &mut Frame, app: &App, area: Rect) {
    let history = app.engine.history();
    let points: Vec<(f64, f64)> = history
        .samples()
        .enumerate()
        .map(|(idx, count)| (idx as f64, count as f64))
        .collect();
    let stats = history.stats();
    let x_max = (history.capacity().saturating_sub(1) as f64).max(1.0);
    let y_max = ((stats.max as f64) * 1.1).max(1.0);

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(theme::ACCENT))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(block(app.history_title()))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .style(Style::default().fg(theme::MUTED)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.0}")),
                ])
                .style(Style::default().fg(theme::MUTED)),
        );
    f.render_widget(chart, area);
}

fn render_filter(f: &mut Frame, app: &App, area: Rect) {
    let text = if app.engine.filter().is_empty() {
        Line::from(Span::styled("TYPE TO FILTER", theme::PLACEHOLDER_STYLE))
    } else {
        Line::from(Span::styled(
            app.engine.filter().to_string(),
            Style::default().fg(theme::TEXT),
        ))
    };
    f.render_widget(Paragraph::new(text).block(block("Filter")), area);
}

fn render_list(f: &mut Frame, app: &mut App, area: Rect) {
    if !app.engine.has_snapshot() {
        let waiting = Paragraph::new(vec![
            Line::from(Span::styled("Waiting for dump", theme::PLACEHOLDER_STYLE)),
            Line::from(app.source.clone()),
        ])
        .block(block(app.list_title()))
        .wrap(Wrap { trim: true });
        f.render_widget(waiting, area);
        return;
    }

    let items: Vec<ListItem> = app
        .engine
        .filtered()
        .map(|task| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:05} ", task.id)),
                Span::styled(
                    task.status.clone(),
                    Style::default().fg(theme::status_color(&task.status)),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(block(app.list_title()))
        .highlight_style(theme::SELECTED_STYLE);

    app.list_state.select(app.engine.selection());
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let lines = app
        .engine
        .selected_task()
        .map(task_details)
        .unwrap_or_default();
    let details = Paragraph::new(lines)
        .block(block("Details"))
        .wrap(Wrap { trim: false });
    f.render_widget(details, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let updated = app
        .last_update
        .map(|at| format!("updated {}", at.format("%H:%M:%S")))
        .unwrap_or_else(|| "no data yet".to_string());
    let footer = Line::from(vec![
        Span::styled(updated, Style::default().fg(theme::MUTED)),
        Span::raw("  "),
        Span::styled(FOOTER_KEYS, Style::default().fg(theme::ACCENT)),
    ]);
    f.render_widget(
        Paragraph::new(footer).alignment(ratatui::layout::Alignment::Right),
        area,
    );
}

pub fn task_details(task: &Task) -> Vec<Line<'static>> {
    let mut lines = vec![
        field_line("ID: ", task.id.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(
                task.status.clone(),
                theme::EMPHASIS_STYLE.fg(theme::status_color(&task.status)),
            ),
        ]),
        Line::from(""),
    ];

    let mut wait = field_line("Wait Since: ", format!("{} min", task.wait_minutes));
    if task.locked_to_os_thread {
        wait.spans
            .push(Span::styled(" [locked to thread]", theme::EMPHASIS_STYLE));
    }
    lines.push(wait);
    lines.push(Line::from(""));

    if let Some(created_by) = &task.created_by {
        lines.push(Line::from(Span::styled(
            "Created by:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        push_frame(&mut lines, created_by);
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "Trace:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for frame in &task.stack_frames {
        push_frame(&mut lines, frame);
    }
    lines
}

fn field_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(label),
        Span::styled(value, theme::EMPHASIS_STYLE),
    ])
}

fn push_frame(lines: &mut Vec<Line<'static>>, frame: &StackFrame) {
    lines.push(Line::from(format!("  {}", frame.function_signature)));
    lines.push(Line::from(Span::styled(
        format!("     {}", frame.location()),
        theme::LOCATION_STYLE,
    )));
}

fn render_help(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("Help", theme::TITLE_STYLE)),
        Line::from(""),
        Line::from("Arrows up/down: Select from list"),
        Line::from("PgUp/PgDn/Home/End: Jump in list"),
        Line::from("Text input: Filter results"),
        Line::from("Backspace/Esc: Edit/clear filter"),
        Line::from("F2: Pause"),
        Line::from("F10: Quit"),
        Line::from(""),
        Line::from("Press any key to continue"),
    ];
    render_popup(f, centered_rect(40, 40, area), text);
}

fn render_paused(f: &mut Frame, area: Rect) {
    let text = vec![Line::from("Paused. Press any key to continue")];
    render_popup(f, centered_rect(40, 15, area), text);
}

fn render_popup(f: &mut Frame, area: Rect, text: Vec<Line<'static>>) {
    f.render_widget(Clear, area);
    let popup = Paragraph::new(text)
        .style(Style::default().fg(theme::ACCENT))
        .block(block(""))
        .wrap(Wrap { trim: true });
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
