use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

use crate::config::Theme;

/// Key hints shown in the bottom bar, in priority order. Pairs that do not
/// fit are dropped from the right.
pub const CONTROLS: [(&str, &str); 10] = [
    ("F5", "Run"),
    ("^T", "New"),
    ("^W", "Close"),
    ("Tab", "Focus"),
    ("^S", "Save"),
    ("^H", "History"),
    ("^O", "Saved"),
    ("^E", "Export"),
    ("F1", "Help"),
    ("^Q", "Quit"),
];

const STATUS_WIDTH: u16 = 56;

#[derive(Debug, Clone)]
pub struct Controls {
    pub status: Option<String>,
    pub busy: bool,
    pub frame: usize,
    pub bg_color: Color,
    pub key_color: Color,
    pub label_color: Color,
    pub busy_color: Color,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            status: None,
            busy: false,
            frame: 0,
            bg_color: Color::Indexed(236),
            key_color: Color::Cyan,
            label_color: Color::White,
            busy_color: Color::Yellow,
        }
    }
}

impl Controls {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            bg_color: theme.get("controls_bg"),
            key_color: theme.get("primary"),
            label_color: theme.get("text_primary"),
            busy_color: theme.get("warning"),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_busy(mut self, busy: bool, frame: usize) -> Self {
        self.busy = busy;
        self.frame = frame;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let base = if self.bg_color == Color::Reset {
            Style::default()
        } else {
            Block::default()
                .style(Style::default().bg(self.bg_color))
                .render(area, buf);
            Style::default().bg(self.bg_color)
        };

        let pair_width =
            |(key, label): &(&str, &str)| key.chars().count() as u16 + label.chars().count() as u16 + 2;

        const SPINNER_WIDTH: u16 = 3;
        let status_width = if self.status.is_some() {
            STATUS_WIDTH.min(area.width / 2)
        } else {
            0
        };
        let mut available = area.width.saturating_sub(status_width + SPINNER_WIDTH);
        let shown: Vec<&(&str, &str)> = CONTROLS
            .iter()
            .take_while(|pair| {
                let need = pair_width(*pair);
                if available >= need {
                    available -= need;
                    true
                } else {
                    false
                }
            })
            .collect();

        let mut constraints: Vec<Constraint> = shown
            .iter()
            .flat_map(|(key, label)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 1),
                    Constraint::Length(label.chars().count() as u16 + 1),
                ]
            })
            .collect();
        constraints.push(Constraint::Fill(1));
        constraints.push(Constraint::Length(status_width));
        constraints.push(Constraint::Length(SPINNER_WIDTH));
        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        for (i, (key, label)) in shown.iter().enumerate() {
            Paragraph::new(*key)
                .style(base.fg(self.key_color))
                .render(layout[i * 2], buf);
            Paragraph::new(*label)
                .style(base.fg(self.label_color))
                .render(layout[i * 2 + 1], buf);
        }

        let fill = shown.len() * 2;
        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(base.fg(self.label_color))
                .right_aligned()
                .render(layout[fill + 1], buf);
        }

        const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
        let spinner = if self.busy {
            SPINNER[self.frame % SPINNER.len()].to_string()
        } else {
            " ".to_string()
        };
        Paragraph::new(spinner)
            .style(base.fg(self.busy_color))
            .centered()
            .render(layout[fill + 2], buf);
    }
}
