use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use bookdesk_core::utils::{format_optional, format_phone, truncate};
use bookdesk_core::BookingRequest;

use crate::app::App;
use crate::ui::styles;

/// Longest name shown in the list before truncating.
const NAME_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    render_booking_list(frame, app, chunks[0]);
    render_booking_detail(frame, app, chunks[1]);
}

fn render_booking_list(frame: &mut Frame, app: &App, area: Rect) {
    let header_cells = [
        Cell::from(""),
        Cell::from("Name"),
        Cell::from("Event"),
        Cell::from("Date"),
        Cell::from("Received"),
    ];
    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let snapshot = &app.snapshot;
    let rows: Vec<Row> = snapshot
        .records
        .iter()
        .map(|booking| {
            let checked = snapshot.is_selected(&booking.id);
            let mark = if checked { "[x]" } else { "[ ]" };
            let style = if checked {
                styles::checked_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(mark),
                Cell::from(truncate(&booking.name, NAME_WIDTH)),
                Cell::from(format_optional(booking.event_type.as_deref(), "-")),
                Cell::from(booking.formatted_event_date()),
                Cell::from(booking.created_at.format("%b %d").to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(13),
        Constraint::Length(8),
    ];

    let title = if snapshot.selected.is_empty() {
        format!(" {} ({}) ", app.current_tab.title(), snapshot.records.len())
    } else {
        format!(
            " {} ({}) - {} selected ",
            app.current_tab.title(),
            snapshot.records.len(),
            snapshot.selected.len()
        )
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default().with_offset(app.effective_scroll());
    if !snapshot.records.is_empty() {
        state.select(Some(app.cursor));
    }

    frame.render_stateful_widget(table, area, &mut state);

    if snapshot.records.is_empty() && !snapshot.loading {
        let inner = Rect {
            x: area.x + 2,
            y: area.y + 2,
            width: area.width.saturating_sub(4),
            height: 1,
        };
        let empty = Paragraph::new(Span::styled(
            format!("No {} requests", app.current_tab.title().to_lowercase()),
            styles::muted_style(),
        ));
        frame.render_widget(empty, inner);
    }
}

fn render_booking_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.detail_view() {
        Some(booking) => detail_lines(app, booking),
        None => vec![Line::from(Span::styled(
            "No request selected",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Request ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn field<'a>(label: &'static str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

fn detail_lines<'a>(app: &App, booking: &'a BookingRequest) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(booking.name.as_str(), styles::title_style())),
        Line::from(""),
        field("Email:", booking.email.clone()),
    ];

    if let Some(ref phone) = booking.phone {
        lines.push(field("Phone:", format_phone(phone)));
    }

    lines.push(field(
        "Event:",
        format_optional(booking.event_type.as_deref(), "-"),
    ));
    lines.push(field("Date:", booking.formatted_event_date()));
    if let Some(count) = booking.guest_count {
        lines.push(field("Guests:", count.to_string()));
    }
    lines.push(Line::from(vec![
        Span::styled(format!("{:<10}", "Status:"), styles::muted_style()),
        Span::styled(booking.status.to_string(), styles::status_style(booking.status)),
    ]));
    lines.push(field(
        "Received:",
        booking.created_at.format("%b %d, %Y %H:%M").to_string(),
    ));

    lines.push(Line::from(""));

    match booking.message {
        Some(ref message) if !message.trim().is_empty() => {
            lines.push(Line::from(Span::styled("Message", styles::highlight_style())));
            for line in message.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        _ if app.detail_loading => {
            lines.push(Line::from(Span::styled("Loading...", styles::muted_style())));
        }
        _ => match app.details.age_display(&booking.id) {
            Some(_) => {
                lines.push(Line::from(Span::styled("No message", styles::muted_style())));
            }
            None => {
                lines.push(Line::from(Span::styled(
                    "Full request not loaded (Enter to retry)",
                    styles::muted_style(),
                )));
            }
        },
    }

    if let Some(age) = app.details.age_display(&booking.id) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Loaded {}", age),
            styles::muted_style(),
        )));
    }

    lines
}
