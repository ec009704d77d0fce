use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// The availability calendar has no status store behind it; its list is
/// always empty, so this tab only explains where to manage it.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Availability is managed from the calendar view.",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Booking requests are reviewed on tabs 1-3.",
            styles::muted_style(),
        )),
    ];

    if app.snapshot.loading {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Loading...", styles::muted_style())));
    }

    let block = Block::default()
        .title(" Availability ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
