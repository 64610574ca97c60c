use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Debug, Default)]
pub struct DebugState {
    pub enabled: bool,
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub num_completions: usize,
    pub num_stale: usize,
    pub last_key_event_name: String,
    /// Last intent dispatched, for checking key bindings.
    pub last_action: String,
    /// Tabs and running tabs at render time.
    pub tabs: usize,
    pub running: usize,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}+{:?}", event.modifiers, event.code);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(format!(
            "events={} keys={} last_key={} last_action={} completions={} stale={} tabs={} running={} frames={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_action,
            self.num_completions,
            self.num_stale,
            self.tabs,
            self.running,
            self.num_frames,
        ))
        .render(area, buf);
    }
}
