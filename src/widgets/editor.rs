use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Widget},
};
use tui_textarea::{Input, Key, TextArea};

/// Multi-line SQL editor for the active tab.
pub struct SqlEditor {
    textarea: TextArea<'static>,
    focused: bool,
    border_color: Color,
    focused_color: Color,
}

impl Default for SqlEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlEditor {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_cursor_line_style(Style::default());
        Self {
            textarea,
            focused: false,
            border_color: Color::DarkGray,
            focused_color: Color::Cyan,
        }
    }

    pub fn with_colors(mut self, border_color: Color, focused_color: Color) -> Self {
        self.border_color = border_color;
        self.focused_color = focused_color;
        self
    }

    /// Replace the contents, leaving the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        self.textarea = TextArea::new(lines);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Feed a key to the text area. Returns true when the text changed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        self.textarea.input(key_event_to_input(event))
    }
}

impl Widget for &SqlEditor {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = if self.focused {
            self.focused_color
        } else {
            self.border_color
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .title(" SQL ");
        let inner = block.inner(area);
        block.render(area, buf);

        let mut textarea = self.textarea.clone();
        let cursor = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        textarea.set_cursor_style(cursor);
        (&textarea).render(inner, buf);
    }
}

/// Convert a crossterm key into the text area's input type.
pub(crate) fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Esc,
        _ => Key::Null,
    };
    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}
