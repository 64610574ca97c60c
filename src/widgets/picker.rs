use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::export::ExportFormat;

/// Which list the picker shows, and what selecting an item means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerKind {
    History,
    Saved,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub label: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    None,
    Select(usize),
    Delete(usize),
    Cancel,
}

pub struct Picker {
    pub kind: PickerKind,
    title: String,
    items: Vec<PickerItem>,
    state: ListState,
    accent: Color,
    dimmed: Color,
}

impl Picker {
    pub fn new(kind: PickerKind, title: impl Into<String>, items: Vec<PickerItem>) -> Self {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }
        Self {
            kind,
            title: title.into(),
            items,
            state,
            accent: Color::Cyan,
            dimmed: Color::DarkGray,
        }
    }

    /// The export format list.
    pub fn export_formats() -> Self {
        let items = ExportFormat::ALL
            .iter()
            .map(|f| PickerItem {
                label: f.label().to_string(),
                detail: format!(".{}", f.extension()),
            })
            .collect();
        Self::new(PickerKind::Export, "Export visible rows", items)
    }

    pub fn with_colors(mut self, accent: Color, dimmed: Color) -> Self {
        self.accent = accent;
        self.dimmed = dimmed;
        self
    }

    pub fn items(&self) -> &[PickerItem] {
        &self.items
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    /// Drop an item after it was deleted from the store.
    pub fn remove(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
        match self.items.len() {
            0 => self.state.select(None),
            n => self.state.select(Some(index.min(n - 1))),
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> PickerEvent {
        let Some(selected) = self.state.selected() else {
            return match event.code {
                KeyCode::Esc | KeyCode::Char('q') => PickerEvent::Cancel,
                _ => PickerEvent::None,
            };
        };
        match event.code {
            KeyCode::Esc | KeyCode::Char('q') => PickerEvent::Cancel,
            KeyCode::Enter => PickerEvent::Select(selected),
            KeyCode::Delete | KeyCode::Char('d') if self.kind == PickerKind::Saved => {
                PickerEvent::Delete(selected)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select(Some((selected + 1).min(self.items.len() - 1)));
                PickerEvent::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select(Some(selected.saturating_sub(1)));
                PickerEvent::None
            }
            KeyCode::Home => {
                self.state.select(Some(0));
                PickerEvent::None
            }
            KeyCode::End => {
                self.state.select(Some(self.items.len() - 1));
                PickerEvent::None
            }
            _ => PickerEvent::None,
        }
    }
}

impl Widget for &mut Picker {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let hint = match self.kind {
            PickerKind::Saved => " Enter load  d delete  Esc close ",
            PickerKind::History => " Enter load  Esc close ",
            PickerKind::Export => " Enter export  Esc close ",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.accent))
            .title(format!(" {} ", self.title))
            .title_bottom(hint);

        if self.items.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            Line::from(Span::styled("(empty)", Style::default().fg(self.dimmed)))
                .render(inner, buf);
            return;
        }

        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let label: String = item.label.replace('\n', " ").chars().take(width).collect();
                let room = width.saturating_sub(label.chars().count() + 2);
                let detail: String = item.detail.chars().take(room).collect();
                ListItem::new(Line::from(vec![
                    Span::raw(label),
                    Span::raw("  "),
                    Span::styled(detail, Style::default().fg(self.dimmed)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(self.accent).add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, area, buf, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn items(n: usize) -> Vec<PickerItem> {
        (0..n)
            .map(|i| PickerItem {
                label: format!("q{i}"),
                detail: String::new(),
            })
            .collect()
    }

    fn press(picker: &mut Picker, code: KeyCode) -> PickerEvent {
        picker.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut picker = Picker::new(PickerKind::History, "History", items(2));
        press(&mut picker, KeyCode::Down);
        press(&mut picker, KeyCode::Down);
        assert_eq!(press(&mut picker, KeyCode::Enter), PickerEvent::Select(1));
        press(&mut picker, KeyCode::Up);
        press(&mut picker, KeyCode::Up);
        assert_eq!(picker.selected(), Some(0));
    }

    #[test]
    fn test_delete_only_in_saved_list() {
        let mut history = Picker::new(PickerKind::History, "History", items(1));
        assert_eq!(press(&mut history, KeyCode::Char('d')), PickerEvent::None);

        let mut saved = Picker::new(PickerKind::Saved, "Saved", items(2));
        press(&mut saved, KeyCode::Down);
        assert_eq!(press(&mut saved, KeyCode::Char('d')), PickerEvent::Delete(1));
        saved.remove(1);
        assert_eq!(saved.selected(), Some(0));
        saved.remove(0);
        assert_eq!(saved.selected(), None);
        assert_eq!(press(&mut saved, KeyCode::Enter), PickerEvent::None);
    }

    #[test]
    fn test_export_formats_listed() {
        let picker = Picker::export_formats();
        assert_eq!(picker.items().len(), ExportFormat::ALL.len());
        assert_eq!(picker.items()[0].detail, ".csv");
    }
}
