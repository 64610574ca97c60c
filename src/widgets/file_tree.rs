use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::browser::FileBrowser;

/// Left-hand pane listing the browser's visible entries.
pub struct FileTree<'a> {
    browser: &'a FileBrowser,
    focused: bool,
    border_color: Color,
    focused_color: Color,
    directory_color: Color,
    file_color: Color,
}

impl<'a> FileTree<'a> {
    pub fn new(browser: &'a FileBrowser, focused: bool) -> Self {
        Self {
            browser,
            focused,
            border_color: Color::DarkGray,
            focused_color: Color::Cyan,
            directory_color: Color::Blue,
            file_color: Color::White,
        }
    }

    pub fn with_colors(
        mut self,
        border_color: Color,
        focused_color: Color,
        directory_color: Color,
        file_color: Color,
    ) -> Self {
        self.border_color = border_color;
        self.focused_color = focused_color;
        self.directory_color = directory_color;
        self.file_color = file_color;
        self
    }
}

impl Widget for FileTree<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = self
            .browser
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.browser.root().display().to_string());
        let border = if self.focused {
            self.focused_color
        } else {
            self.border_color
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", title));

        let items: Vec<ListItem> = self
            .browser
            .entries()
            .iter()
            .map(|entry| {
                let indent = "  ".repeat(entry.depth);
                let (icon, color) = if entry.is_dir {
                    ("▸ ", self.directory_color)
                } else {
                    ("  ", self.file_color)
                };
                ListItem::new(Line::from(vec![
                    Span::raw(indent),
                    Span::styled(format!("{}{}", icon, entry.name), Style::default().fg(color)),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(self.browser.selected()));
        }
        let highlight = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let list = List::new(items).block(block).highlight_style(highlight);
        StatefulWidget::render(list, area, buf, &mut state);
    }
}
