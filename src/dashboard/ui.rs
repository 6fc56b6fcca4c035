// Rendering for the usage dashboard
use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};

use crate::dashboard::state::DashboardState;
use crate::utils::{DateFormatter, format_gb, format_percent};

pub struct RenderContext<'a> {
    pub formatter: &'a DateFormatter,
    pub decimal_places: u8,
}

pub fn render(f: &mut Frame, state: &DashboardState, ctx: &RenderContext) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Gauge
            Constraint::Min(0),    // Details
            Constraint::Length(1), // Status line
        ])
        .split(f.size());

    render_header(f, chunks[0], state);
    render_gauge(f, chunks[1], state);
    render_details(f, chunks[2], state, ctx);
    render_status_line(f, chunks[3], state);

    if state.show_help {
        render_help_popup(f);
    }
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState) {
    let level = state.level();
    let header_text = vec![Line::from(vec![
        Span::styled(
            "Aquiss Usage",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            level.label(),
            Style::default().fg(level.to_color()).add_modifier(Modifier::BOLD),
        ),
    ])];

    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title("Broadband Usage Monitor"));
    f.render_widget(header, area);
}

fn render_gauge(f: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default().borders(Borders::ALL).title("Peak Allowance");

    match state.gauge_ratio() {
        Some(ratio) => {
            let label = state
                .snapshot
                .as_ref()
                .zip(state.allowance_gib)
                .map(|(snapshot, allowance)| format_percent(snapshot.peak_ratio(allowance)))
                .unwrap_or_default();
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(state.level().to_color()))
                .ratio(ratio)
                .label(label);
            f.render_widget(gauge, area);
        }
        None => {
            let text = if state.allowance_gib.is_none() {
                "No allowance set. Run `aquiss-usage login --allowance <GB>`."
            } else {
                "No usage data"
            };
            let placeholder = Paragraph::new(text)
                .style(Style::default().fg(Color::Gray))
                .block(block);
            f.render_widget(placeholder, area);
        }
    }
}

fn render_details(f: &mut Frame, area: Rect, state: &DashboardState, ctx: &RenderContext) {
    let block = Block::default().borders(Borders::ALL).title("Current Period");

    let Some(snapshot) = state.snapshot.as_ref() else {
        let placeholder = Paragraph::new(state.status_line())
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(placeholder, area);
        return;
    };

    let dp = ctx.decimal_places;
    let mut lines = vec![
        detail_line("Peak", format_gb(snapshot.peak_gib, dp), Color::Yellow),
        detail_line("Off-peak", format_gb(snapshot.off_peak_gib, dp), Color::Green),
        detail_line("Total", format_gb(snapshot.total_gib, dp), Color::White),
    ];

    if let Some(allowance) = state.allowance_gib {
        lines.push(detail_line("Allowance", format_gb(allowance, dp), Color::White));
        lines.push(detail_line(
            "Remaining",
            format_gb(snapshot.remaining_gib(allowance), dp),
            state.level().to_color(),
        ));
    }

    lines.push(Line::raw(""));
    lines.push(detail_line(
        "Period began",
        ctx.formatter.format_date(&snapshot.period_start),
        Color::Cyan,
    ));
    lines.push(detail_line(
        "Period ends",
        ctx.formatter.format_date(&snapshot.period_end),
        Color::Cyan,
    ));
    lines.push(detail_line(
        "Days remaining",
        snapshot.days_remaining(Utc::now()).to_string(),
        Color::Cyan,
    ));

    let details = Paragraph::new(lines).block(block);
    f.render_widget(details, area);
}

fn detail_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{:<16}", format!("{}:", label))),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn render_status_line(f: &mut Frame, area: Rect, state: &DashboardState) {
    let color = if state.last_error.is_some() && !state.refreshing {
        Color::Red
    } else {
        Color::Gray
    };
    let status_text = format!(
        "{} | 'r' refresh | 'l' logout | 'h' help | 'q' quit",
        state.status_line()
    );

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    f.render_widget(status, area);
}

fn render_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 50, f.size());

    f.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled(
            "Aquiss Usage - Help",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("Peak usage is measured against your monthly allowance."),
        Line::raw("Each alert threshold notifies once per billing period."),
        Line::raw(""),
        Line::raw("Controls:"),
        Line::raw("  r            - Refresh usage now"),
        Line::raw("  l            - Log out and quit"),
        Line::raw("  h / F1       - Show/Hide help"),
        Line::raw("  q / Esc      - Quit"),
        Line::raw(""),
        Line::raw("Press 'h' again to close this help."),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_alignment(Alignment::Center),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
