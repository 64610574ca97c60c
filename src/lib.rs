use std::path::{Path, PathBuf};
use std::sync::{mpsc::Sender, Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use openduck_cli::FileFormat;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod browser;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod error_display;
pub mod export;
pub mod logging;
pub mod registry;
pub mod result;
pub mod result_view;
pub mod session;
pub mod statement;
pub mod store;
pub mod widgets;
pub mod worker;

pub use cache::CacheManager;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use engine::{DuckDbEngine, QueryEngine};
pub use registry::{Dispatched, Intent, SessionRegistry};
pub use store::QueryStore;

use browser::{Activation, FileBrowser};
use config::DisplayConfig;
use error_display::{execution_lines, user_message_from_registry};
use export::ExportFormat;
use registry::ApplyOutcome;
use session::{Phase, SessionId};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::editor::SqlEditor;
use widgets::file_tree::FileTree;
use widgets::picker::{Picker, PickerEvent, PickerItem, PickerKind};
use widgets::prompt::{Prompt, PromptEvent, PromptKind};
use widgets::results_table::{ResultsBody, ResultsState, ResultsTable, TableColors};
use widgets::tabs::TabBar;
use worker::{Completion, Executor};

/// Application name used for cache and config directories
pub const APP_NAME: &str = "openduck";

const HELP_TEXT: &str = "\
Tabs
  F5 / Ctrl+R     Run the tab's SQL
  Ctrl+T          New query tab
  Ctrl+W          Close tab (cancels a running query)
  Ctrl+N / Ctrl+P Next / previous tab
  Tab             Cycle focus: files, editor, results

Queries
  Ctrl+S          Save the tab's SQL under a name
  Ctrl+H          Pick from history
  Ctrl+O          Pick a saved query (d deletes)
  Ctrl+E          Export the visible rows

Files
  Enter           Expand a directory or open a file
  Backspace       Browse the parent directory
  r               Re-read the directory tree

Results
  Arrows / hjkl   Move the cursor
  f               Filter the selected column
  s               Sort by the selected column (asc, desc, off)
  S               Reset sort
  c               Clear filters and sort

  F1              Toggle this help
  Ctrl+Q          Quit";

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Open a preview tab for a data file.
    Open(PathBuf),
    /// A worker finished a run.
    QueryFinished(Completion),
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

/// Pane that receives unbound keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    Browser,
    #[default]
    Editor,
    Results,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Browser => Focus::Editor,
            Focus::Editor => Focus::Results,
            Focus::Results => Focus::Browser,
        }
    }

    fn prev(self) -> Self {
        self.next().next()
    }
}

enum Modal {
    Help,
    Error(String),
    Picker(Picker),
    Prompt(Prompt),
}

pub struct App {
    events: Sender<AppEvent>,
    registry: SessionRegistry,
    browser: FileBrowser,
    editor: SqlEditor,
    /// Tab and buffer text last loaded into the editor.
    editor_source: Option<(SessionId, String)>,
    focus: Focus,
    results: ResultsState,
    modal: Option<Modal>,
    /// One-shot status message, cleared by the next key.
    message: Option<String>,
    theme: Theme,
    display: DisplayConfig,
    debug: DebugState,
}

impl App {
    pub fn send_event(&mut self, event: AppEvent) -> color_eyre::Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    /// Build the app around `store` and `engine`. Workers post their
    /// completions back onto `events`.
    pub fn new_with_config(
        events: Sender<AppEvent>,
        theme: Theme,
        config: &AppConfig,
        store: QueryStore,
        engine: Arc<dyn QueryEngine>,
    ) -> App {
        let sink = events.clone();
        let executor = Executor::new(
            engine,
            config.performance.max_concurrent_queries,
            move |completion| {
                if sink.send(AppEvent::QueryFinished(completion)).is_err() {
                    tracing::debug!("event loop closed, dropping completion");
                }
            },
        );

        let startup_sql = store
            .last_history()
            .map(|entry| entry.sql.clone())
            .unwrap_or_default();
        let mut registry = SessionRegistry::new(store, executor, config.registry_options());
        registry.new_scratch("Main", startup_sql);

        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let editor = SqlEditor::new().with_colors(theme.get("editor_border"), theme.get("primary"));

        let mut app = App {
            events,
            registry,
            browser: FileBrowser::new(root),
            editor,
            editor_source: None,
            focus: Focus::default(),
            results: ResultsState::default(),
            modal: None,
            message: None,
            theme,
            display: config.display.clone(),
            debug: DebugState::default(),
        };
        app.sync_editor();
        app
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn set_browser_root(&mut self, root: &Path) {
        self.browser = FileBrowser::new(root);
    }

    /// Show a warning in the status bar on the next frame.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.registry.push_warning(message);
        self.drain_warnings();
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    /// Open a preview tab for `path`; `format` overrides extension detection.
    pub fn open_path(&mut self, path: &Path, format: Option<FileFormat>) {
        match self.registry.open_file(path, format) {
            Ok(id) => {
                self.debug.last_action = format!("open {id}");
                self.results = ResultsState::default();
                self.sync_editor();
            }
            Err(e) => self.show_error(user_message_from_registry(&e)),
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        let next = match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path) => {
                self.open_path(path, None);
                None
            }
            AppEvent::QueryFinished(completion) => {
                self.finish(completion.clone());
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        };
        self.sync_editor();
        self.drain_warnings();
        next
    }

    fn finish(&mut self, completion: Completion) {
        let session = completion.session;
        self.debug.num_completions += 1;
        match self.registry.apply_completion(completion) {
            ApplyOutcome::Applied => {
                if self.registry.active_id() == Some(session) {
                    self.results = ResultsState::default();
                }
            }
            ApplyOutcome::Stale | ApplyOutcome::UnknownSession => self.debug.num_stale += 1,
        }
    }

    fn dispatch(&mut self, intent: Intent) -> Option<Dispatched> {
        self.debug.last_action = intent_label(&intent).to_string();
        match self.registry.dispatch(intent) {
            Ok(done) => Some(done),
            Err(e) => {
                tracing::debug!("intent failed: {e}");
                self.show_error(user_message_from_registry(&e));
                None
            }
        }
    }

    fn show_error(&mut self, message: String) {
        self.modal = Some(Modal::Error(message));
    }

    fn drain_warnings(&mut self) {
        if let Some(last) = self.registry.take_warnings().pop() {
            self.message = Some(last);
        }
    }

    /// Reload the editor when the active tab or its buffer changed under it.
    fn sync_editor(&mut self) {
        let Some(session) = self.registry.active() else {
            if self.editor_source.take().is_some() {
                self.editor.set_text("");
            }
            return;
        };
        let current = match &self.editor_source {
            Some((id, text)) => *id == session.id() && text == session.buffer(),
            None => false,
        };
        if !current {
            self.editor.set_text(session.buffer());
            self.editor_source = Some((session.id(), session.buffer().to_string()));
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.debug.on_key(event);

        if self.modal.is_some() {
            self.modal_key(event);
            return None;
        }
        self.message = None;

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('q') if ctrl => return Some(AppEvent::Exit),
            KeyCode::F(5) => self.run_active(),
            KeyCode::Char('r') if ctrl => self.run_active(),
            KeyCode::Char('t') if ctrl => {
                self.dispatch(Intent::NewScratch);
                self.results = ResultsState::default();
                self.focus = Focus::Editor;
            }
            KeyCode::Char('w') if ctrl => {
                if let Some(id) = self.registry.active_id() {
                    self.dispatch(Intent::Close(id));
                    self.results = ResultsState::default();
                }
            }
            KeyCode::Char('n') if ctrl => {
                self.registry.next_tab();
                self.results = ResultsState::default();
            }
            KeyCode::Char('p') if ctrl => {
                self.registry.prev_tab();
                self.results = ResultsState::default();
            }
            KeyCode::Char('s') if ctrl => self.open_save_prompt(),
            KeyCode::Char('h') if ctrl => self.open_history(),
            KeyCode::Char('o') if ctrl => self.open_saved(),
            KeyCode::Char('e') if ctrl => self.open_export(),
            KeyCode::F(1) => self.modal = Some(Modal::Help),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            _ => match self.focus {
                Focus::Browser => self.browser_key(event),
                Focus::Editor => self.editor_key(event),
                Focus::Results => self.results_key(event),
            },
        }
        None
    }

    fn modal_key(&mut self, event: &KeyEvent) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        match modal {
            Modal::Help => {
                if !matches!(event.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q')) {
                    self.modal = Some(Modal::Help);
                }
            }
            Modal::Error(message) => {
                if !matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                    self.modal = Some(Modal::Error(message));
                }
            }
            Modal::Picker(mut picker) => match picker.handle_key(event) {
                PickerEvent::None => self.modal = Some(Modal::Picker(picker)),
                PickerEvent::Cancel => {}
                PickerEvent::Select(index) => self.pick(&picker, index),
                PickerEvent::Delete(index) => {
                    if let Some(item) = picker.items().get(index) {
                        let name = item.label.clone();
                        if let Some(Dispatched::Deleted(true)) =
                            self.dispatch(Intent::DeleteSaved(name.clone()))
                        {
                            self.message = Some(format!("Deleted saved query '{name}'"));
                        }
                        picker.remove(index);
                    }
                    self.modal = Some(Modal::Picker(picker));
                }
            },
            Modal::Prompt(mut prompt) => match prompt.handle_key(event) {
                PromptEvent::None => self.modal = Some(Modal::Prompt(prompt)),
                PromptEvent::Cancel => {}
                PromptEvent::Submit(text) => self.submit_prompt(prompt.kind, text),
            },
        }
    }

    fn run_active(&mut self) {
        let Some(id) = self.registry.active_id() else {
            return;
        };
        if let Some(Dispatched::NothingToRun) = self.dispatch(Intent::Run(id)) {
            self.message = Some("Nothing to run".to_string());
        }
    }

    fn open_save_prompt(&mut self) {
        if self.registry.active_id().is_none() {
            return;
        }
        let prompt = Prompt::new(PromptKind::SaveName, "Save query as", "")
            .with_border_color(self.color("primary"));
        self.modal = Some(Modal::Prompt(prompt));
    }

    fn open_history(&mut self) {
        let items = self
            .registry
            .store()
            .list_history()
            .iter()
            .rev()
            .map(|entry| PickerItem {
                label: entry.sql.clone(),
                detail: entry
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            })
            .collect();
        self.open_picker(Picker::new(PickerKind::History, "History", items));
    }

    fn open_saved(&mut self) {
        let items = self
            .registry
            .store()
            .list_saved()
            .map(|query| PickerItem {
                label: query.name.clone(),
                detail: query.sql.lines().next().unwrap_or_default().to_string(),
            })
            .collect();
        self.open_picker(Picker::new(PickerKind::Saved, "Saved queries", items));
    }

    fn open_export(&mut self) {
        let has_result = self
            .registry
            .active()
            .is_some_and(|s| s.last_result().is_some());
        if has_result {
            self.open_picker(Picker::export_formats());
        } else {
            self.message = Some("Run a query before exporting".to_string());
        }
    }

    fn open_picker(&mut self, picker: Picker) {
        let picker = picker.with_colors(self.color("primary"), self.color("dimmed"));
        self.modal = Some(Modal::Picker(picker));
    }

    fn pick(&mut self, picker: &Picker, index: usize) {
        let Some(session) = self.registry.active_id() else {
            return;
        };
        match picker.kind {
            PickerKind::History => {
                // newest first on screen
                let len = self.registry.store().list_history().len();
                if let Some(index) = len.checked_sub(index + 1) {
                    self.dispatch(Intent::LoadHistory { session, index });
                    self.focus = Focus::Editor;
                }
            }
            PickerKind::Saved => {
                if let Some(item) = picker.items().get(index) {
                    let name = item.label.clone();
                    self.dispatch(Intent::LoadSaved { session, name });
                    self.focus = Focus::Editor;
                }
            }
            PickerKind::Export => {
                let Some(&format) = ExportFormat::ALL.get(index) else {
                    return;
                };
                let dir = self.export_dir(session);
                if let Some(Dispatched::Exported(path)) = self.dispatch(Intent::Export {
                    session,
                    format,
                    dir,
                }) {
                    tracing::info!(path = %path.display(), "exported result");
                    self.message = Some(format!("Exported to {}", path.display()));
                }
            }
        }
    }

    /// File tabs export next to their file, other tabs into the browsed
    /// directory.
    fn export_dir(&self, id: SessionId) -> PathBuf {
        self.registry
            .session(id)
            .ok()
            .and_then(|s| s.path())
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.browser.root().to_path_buf())
    }

    fn submit_prompt(&mut self, kind: PromptKind, text: String) {
        match kind {
            PromptKind::SaveName => {
                let Some(session) = self.registry.active_id() else {
                    return;
                };
                if let Some(Dispatched::Saved(name)) =
                    self.dispatch(Intent::Save { session, name: text })
                {
                    self.message = Some(format!("Saved query '{name}'"));
                }
            }
            PromptKind::ColumnFilter(column) => {
                if let Some(session) = self.registry.active_mut() {
                    session.view.set_filter(column, &text);
                    self.results.row = 0;
                    self.results.offset = 0;
                }
            }
        }
    }

    fn browser_key(&mut self, event: &KeyEvent) {
        match event.code {
            KeyCode::Down | KeyCode::Char('j') => self.browser.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.browser.select_prev(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                if let Activation::OpenFile(path) = self.browser.activate() {
                    self.open_path(&path, None);
                }
            }
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => self.browser.go_up(),
            KeyCode::Char('r') => self.browser.refresh(),
            _ => {}
        }
    }

    fn editor_key(&mut self, event: &KeyEvent) {
        if !self.editor.handle_key(event) {
            return;
        }
        let Some(id) = self.registry.active_id() else {
            return;
        };
        let text = self.editor.text();
        self.dispatch(Intent::Edit(id, text.clone()));
        self.editor_source = Some((id, text));
    }

    /// Visible row and column counts of the active tab's result.
    fn result_shape(&self) -> (usize, usize) {
        self.registry
            .active()
            .and_then(|s| {
                s.last_result()
                    .map(|r| (s.view.visible_rows(r).len(), r.columns.len()))
            })
            .unwrap_or((0, 0))
    }

    fn results_key(&mut self, event: &KeyEvent) {
        let (rows, columns) = self.result_shape();
        if columns == 0 {
            return;
        }
        let column = self.results.column;
        match event.code {
            KeyCode::Down | KeyCode::Char('j') => self.results.down(rows, 1),
            KeyCode::Up | KeyCode::Char('k') => self.results.up(1),
            KeyCode::PageDown => self.results.down(rows, 20),
            KeyCode::PageUp => self.results.up(20),
            KeyCode::Home | KeyCode::Char('g') => self.results.row = 0,
            KeyCode::End | KeyCode::Char('G') => self.results.row = rows.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => self.results.right(columns),
            KeyCode::Left | KeyCode::Char('h') => self.results.left(),
            KeyCode::Char('f') => {
                let Some(session) = self.registry.active() else {
                    return;
                };
                let name = session
                    .last_result()
                    .and_then(|r| r.columns.get(column))
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                let initial = session.view.filter(column).unwrap_or_default().to_string();
                let prompt = Prompt::new(
                    PromptKind::ColumnFilter(column),
                    format!("Filter {name} (contains)"),
                    &initial,
                )
                .with_border_color(self.color("primary"));
                self.modal = Some(Modal::Prompt(prompt));
            }
            KeyCode::Char('s') => {
                if let Some(session) = self.registry.active_mut() {
                    session.view.cycle_sort(column);
                }
            }
            KeyCode::Char('S') => {
                if let Some(session) = self.registry.active_mut() {
                    session.view.reset_sort();
                }
            }
            KeyCode::Char('c') => {
                if let Some(session) = self.registry.active_mut() {
                    session.view.clear();
                }
                self.results = ResultsState::default();
            }
            _ => {}
        }
    }

    fn render_results(&mut self, area: Rect, buf: &mut Buffer) {
        let colors = TableColors {
            border: self.color("table_border"),
            focused: self.color("primary"),
            header: self.color("table_header"),
            selected: self.color("table_selected"),
            null: self.color("null_value"),
            error: self.color("error"),
            dimmed: self.color("dimmed"),
        };
        let focused = self.focus == Focus::Results;
        let Some(session) = self.registry.active() else {
            ResultsTable::new(ResultsBody::Empty("No tab open. Press Ctrl+T for a new query."))
                .focused(focused)
                .with_colors(colors)
                .render(area, buf, &mut self.results);
            return;
        };

        let rows;
        let body = match (session.phase(), session.last_result()) {
            (Phase::Failed, _) => ResultsBody::Error(
                session
                    .metadata()
                    .error
                    .as_ref()
                    .map(execution_lines)
                    .unwrap_or_default(),
            ),
            (_, Some(result)) => {
                rows = session.view.visible_rows(result);
                ResultsBody::Table {
                    result: result.as_ref(),
                    view: &session.view,
                    rows: &rows,
                }
            }
            (Phase::Running, None) => ResultsBody::Empty("Executing..."),
            _ => ResultsBody::Empty("Press F5 to run the query."),
        };
        ResultsTable::new(body)
            .focused(focused)
            .with_display(self.display.max_column_width, self.display.row_numbers)
            .with_colors(colors)
            .render(area, buf, &mut self.results);
    }

    fn render_modal(&mut self, area: Rect, buf: &mut Buffer) {
        let border = self.color("primary");
        let error = self.color("error");
        match &mut self.modal {
            None => {}
            Some(Modal::Help) => {
                let popup = centered_rect(area, 60, 80);
                Clear.render(popup, buf);
                Paragraph::new(HELP_TEXT)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(" Help ")
                            .border_style(Style::default().fg(border)),
                    )
                    .render(popup, buf);
            }
            Some(Modal::Error(message)) => {
                let popup = centered_rect(area, 70, 40);
                Clear.render(popup, buf);
                Paragraph::new(message.as_str())
                    .style(Style::default().fg(error))
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(" Error ")
                            .title_bottom(" Enter to dismiss ")
                            .border_style(Style::default().fg(error)),
                    )
                    .render(popup, buf);
            }
            Some(Modal::Picker(picker)) => picker.render(centered_rect(area, 70, 60), buf),
            Some(Modal::Prompt(prompt)) => prompt.render(centered_rect_fixed(area, 60, 3), buf),
        }
    }
}

fn intent_label(intent: &Intent) -> &'static str {
    match intent {
        Intent::NewScratch => "new_scratch",
        Intent::OpenFile(_) => "open_file",
        Intent::Run(_) => "run",
        Intent::Edit(_, _) => "edit",
        Intent::Close(_) => "close",
        Intent::Switch(_) => "switch",
        Intent::LoadHistory { .. } => "load_history",
        Intent::LoadSaved { .. } => "load_saved",
        Intent::Save { .. } => "save",
        Intent::DeleteSaved(_) => "delete_saved",
        Intent::Export { .. } => "export",
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let mut constraints = vec![
            Constraint::Length(1), // Tabs
            Constraint::Fill(1),
            Constraint::Length(1), // Controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let sessions = self.registry.sessions();
        let active = self
            .registry
            .active_id()
            .and_then(|id| sessions.iter().position(|s| s.id() == id));
        TabBar::new(sessions, active)
            .with_colors(self.color("tab_active"), self.color("tab_inactive"))
            .render(layout[0], buf);

        let browser_width = (area.width / 4).clamp(20, 40);
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(browser_width), Constraint::Fill(1)])
            .split(layout[1]);
        FileTree::new(&self.browser, self.focus == Focus::Browser)
            .with_colors(
                self.color("editor_border"),
                self.color("primary"),
                self.color("directory"),
                self.color("text_primary"),
            )
            .render(main[0], buf);

        let editor_height = (main[1].height / 3).max(5);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(editor_height), Constraint::Fill(1)])
            .split(main[1]);
        self.editor.set_focused(self.focus == Focus::Editor);
        (&self.editor).render(right[0], buf);
        self.render_results(right[1], buf);

        let running = self
            .registry
            .sessions()
            .iter()
            .filter(|s| s.is_running())
            .count();
        let status = self
            .message
            .clone()
            .or_else(|| self.registry.active().map(|s| s.status_line()));
        let mut controls =
            Controls::from_theme(&self.theme).with_busy(running > 0, self.debug.num_frames);
        if let Some(status) = status {
            controls = controls.with_status(status);
        }
        (&controls).render(layout[2], buf);

        if self.debug.enabled {
            self.debug.tabs = self.registry.sessions().len();
            self.debug.running = running;
            (&self.debug).render(layout[3], buf);
        }

        self.render_modal(area, buf);
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
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

fn centered_rect_fixed(r: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect::new(
        r.x + (r.width - width) / 2,
        r.y + (r.height - height) / 2,
        width,
        height,
    )
}
