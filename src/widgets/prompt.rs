use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Widget},
};
use tui_textarea::TextArea;

use super::editor::key_event_to_input;

/// What the prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    SaveName,
    /// Filter text for the column at this index.
    ColumnFilter(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    None,
    Submit(String),
    Cancel,
}

/// One-line text input shown as a popup.
pub struct Prompt {
    pub kind: PromptKind,
    title: String,
    textarea: TextArea<'static>,
    border_color: Color,
}

impl Prompt {
    pub fn new(kind: PromptKind, title: impl Into<String>, initial: &str) -> Self {
        let mut textarea = TextArea::new(vec![initial.to_string()]);
        textarea.set_cursor_line_style(Style::default());
        textarea.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        textarea.move_cursor(tui_textarea::CursorMove::End);
        Self {
            kind,
            title: title.into(),
            textarea,
            border_color: Color::Cyan,
        }
    }

    pub fn with_border_color(mut self, color: Color) -> Self {
        self.border_color = color;
        self
    }

    pub fn value(&self) -> &str {
        self.textarea.lines().first().map(String::as_str).unwrap_or("")
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> PromptEvent {
        match event.code {
            KeyCode::Esc => PromptEvent::Cancel,
            KeyCode::Enter => PromptEvent::Submit(self.value().to_string()),
            // single line
            KeyCode::Tab | KeyCode::BackTab => PromptEvent::None,
            _ => {
                self.textarea.input(key_event_to_input(event));
                PromptEvent::None
            }
        }
    }
}

impl Widget for &Prompt {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .title(format!(" {} ", self.title))
            .title_bottom(" Enter confirm  Esc cancel ");
        let inner = block.inner(area);
        block.render(area, buf);
        (&self.textarea).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(prompt: &mut Prompt, code: KeyCode) -> PromptEvent {
        prompt.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_prompt_edits_and_submits() {
        let mut prompt = Prompt::new(PromptKind::SaveName, "Save query as", "q");
        press(&mut prompt, KeyCode::Char('1'));
        assert_eq!(prompt.value(), "q1");
        assert_eq!(press(&mut prompt, KeyCode::Enter), PromptEvent::Submit("q1".into()));
    }

    #[test]
    fn test_enter_never_adds_a_line() {
        let mut prompt = Prompt::new(PromptKind::ColumnFilter(0), "Filter", "");
        press(&mut prompt, KeyCode::Enter);
        press(&mut prompt, KeyCode::Char('a'));
        assert_eq!(prompt.value(), "a");
        assert_eq!(press(&mut prompt, KeyCode::Esc), PromptEvent::Cancel);
    }
}
