use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Tabs, Widget},
};

use crate::session::{Phase, TabSession};

/// Tab strip across the top. Running tabs carry a `*`, failed tabs a `!`.
pub struct TabBar<'a> {
    sessions: &'a [TabSession],
    active: Option<usize>,
    active_color: Color,
    inactive_color: Color,
}

impl<'a> TabBar<'a> {
    pub fn new(sessions: &'a [TabSession], active: Option<usize>) -> Self {
        Self {
            sessions,
            active,
            active_color: Color::Cyan,
            inactive_color: Color::DarkGray,
        }
    }

    pub fn with_colors(mut self, active_color: Color, inactive_color: Color) -> Self {
        self.active_color = active_color;
        self.inactive_color = inactive_color;
        self
    }
}

pub fn tab_label(session: &TabSession) -> String {
    let marker = match session.phase() {
        Phase::Running => " *",
        Phase::Failed => " !",
        Phase::Idle | Phase::Completed => "",
    };
    format!("{}{}", session.title(), marker)
}

impl Widget for TabBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let titles: Vec<Line> = self
            .sessions
            .iter()
            .map(|s| Line::from(tab_label(s)))
            .collect();
        Tabs::new(titles)
            .select(self.active)
            .style(Style::default().fg(self.inactive_color))
            .highlight_style(
                Style::default()
                    .fg(self.active_color)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
            .divider("|")
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;

    #[test]
    fn test_tab_label_marks_idle_tab_plainly() {
        let session = TabSession::new_scratch(SessionId(1), "Main", "");
        assert_eq!(tab_label(&session), "Main");
    }
}
