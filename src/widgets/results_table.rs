use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use crate::result::{ResultSet, Value, ValueKind, NULL_DISPLAY};
use crate::result_view::ResultView;

/// Cursor and scroll position in the results pane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultsState {
    /// Index into the visible rows.
    pub row: usize,
    pub column: usize,
    /// First visible row drawn at the top of the pane.
    pub offset: usize,
}

impl ResultsState {
    pub fn down(&mut self, rows: usize, by: usize) {
        if rows > 0 {
            self.row = (self.row + by).min(rows - 1);
        }
    }

    pub fn up(&mut self, by: usize) {
        self.row = self.row.saturating_sub(by);
    }

    pub fn right(&mut self, columns: usize) {
        if self.column + 1 < columns {
            self.column += 1;
        }
    }

    pub fn left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    /// Pull the cursor back inside a result that may have shrunk.
    pub fn clamp(&mut self, rows: usize, columns: usize) {
        self.row = self.row.min(rows.saturating_sub(1));
        self.column = self.column.min(columns.saturating_sub(1));
    }

    fn scroll_into_view(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.row < self.offset {
            self.offset = self.row;
        } else if self.row >= self.offset + height {
            self.offset = self.row + 1 - height;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableColors {
    pub border: Color,
    pub focused: Color,
    pub header: Color,
    pub selected: Color,
    pub null: Color,
    pub error: Color,
    pub dimmed: Color,
}

impl Default for TableColors {
    fn default() -> Self {
        Self {
            border: Color::DarkGray,
            focused: Color::Cyan,
            header: Color::Yellow,
            selected: Color::Cyan,
            null: Color::DarkGray,
            error: Color::Red,
            dimmed: Color::DarkGray,
        }
    }
}

/// What the results pane shows for the active tab.
pub enum ResultsBody<'a> {
    Empty(&'a str),
    Table {
        result: &'a ResultSet,
        view: &'a ResultView,
        rows: &'a [usize],
    },
    Error(Vec<String>),
}

pub struct ResultsTable<'a> {
    body: ResultsBody<'a>,
    focused: bool,
    max_column_width: u16,
    row_numbers: bool,
    colors: TableColors,
}

impl<'a> ResultsTable<'a> {
    pub fn new(body: ResultsBody<'a>) -> Self {
        Self {
            body,
            focused: false,
            max_column_width: 40,
            row_numbers: true,
            colors: TableColors::default(),
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn with_display(mut self, max_column_width: u16, row_numbers: bool) -> Self {
        self.max_column_width = max_column_width.max(3);
        self.row_numbers = row_numbers;
        self
    }

    pub fn with_colors(mut self, colors: TableColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn render(self, area: Rect, buf: &mut Buffer, state: &mut ResultsState) {
        let border = if self.focused {
            self.colors.focused
        } else {
            self.colors.border
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(" Results ");

        match self.body {
            ResultsBody::Empty(message) => {
                Paragraph::new(message)
                    .style(Style::default().fg(self.colors.dimmed))
                    .alignment(Alignment::Center)
                    .block(block)
                    .render(area, buf);
            }
            ResultsBody::Error(lines) => {
                let text: Text = lines.into_iter().map(Line::from).collect::<Vec<_>>().into();
                Paragraph::new(text)
                    .style(Style::default().fg(self.colors.error))
                    .wrap(Wrap { trim: false })
                    .block(block.border_style(Style::default().fg(self.colors.error)))
                    .render(area, buf);
            }
            ResultsBody::Table { result, view, rows } => {
                if view.has_filters() {
                    block = block.title(format!(
                        " {} of {} rows ",
                        rows.len(),
                        result.row_count()
                    ));
                }
                let inner = block.inner(area);
                block.render(area, buf);
                // header takes one line
                let height = inner.height.saturating_sub(1) as usize;
                state.clamp(rows.len(), result.columns.len());
                state.scroll_into_view(height);
                render_rows(
                    result,
                    view,
                    rows,
                    state,
                    height,
                    inner,
                    buf,
                    self.max_column_width,
                    self.row_numbers,
                    &self.colors,
                );
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_rows(
    result: &ResultSet,
    view: &ResultView,
    rows: &[usize],
    state: &ResultsState,
    height: usize,
    area: Rect,
    buf: &mut Buffer,
    max_width: u16,
    row_numbers: bool,
    colors: &TableColors,
) {
    let window: Vec<usize> = rows.iter().skip(state.offset).take(height).copied().collect();
    let labels: Vec<String> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| view.header_label(i, &c.name))
        .collect();
    let widths: Vec<u16> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let cells = window
                .iter()
                .filter_map(|&r| result.rows.get(r).and_then(|row| row.get(i)))
                .map(|v| display(v).chars().count());
            cells
                .chain(std::iter::once(label.chars().count()))
                .max()
                .unwrap_or(0)
                .clamp(3, max_width as usize) as u16
        })
        .collect();

    let number_width = if row_numbers {
        rows.len().max(1).to_string().len() as u16
    } else {
        0
    };
    let first = first_column(&widths, state.column, area.width.saturating_sub(number_width + 1));
    let columns: Vec<usize> = (first..widths.len()).collect();

    let mut constraints = Vec::new();
    if row_numbers {
        constraints.push(Constraint::Length(number_width));
    }
    constraints.extend(columns.iter().map(|&i| Constraint::Length(widths[i])));

    let header_style = Style::default()
        .fg(colors.header)
        .add_modifier(Modifier::BOLD);
    let mut header: Vec<Cell> = Vec::new();
    if row_numbers {
        header.push(Cell::from(""));
    }
    header.extend(columns.iter().map(|&i| {
        let style = if i == state.column {
            header_style.add_modifier(Modifier::UNDERLINED)
        } else {
            header_style
        };
        Cell::from(truncate(&labels[i], widths[i])).style(style)
    }));

    let body: Vec<Row> = window
        .iter()
        .enumerate()
        .map(|(pos, &r)| {
            let mut cells = Vec::new();
            if row_numbers {
                cells.push(
                    Cell::from(Line::from((state.offset + pos + 1).to_string()).right_aligned())
                        .style(Style::default().fg(colors.dimmed)),
                );
            }
            let values = result.rows.get(r);
            cells.extend(columns.iter().map(|&i| {
                let value = values.and_then(|row| row.get(i)).unwrap_or(&Value::Null);
                let text = truncate(&display(value), widths[i]);
                let line = match result.columns[i].kind {
                    ValueKind::Int | ValueKind::Float => Line::from(text).right_aligned(),
                    _ => Line::from(text),
                };
                let cell = Cell::from(line);
                if value.is_null() {
                    cell.style(Style::default().fg(colors.null))
                } else {
                    cell
                }
            }));
            let row = Row::new(cells);
            if state.offset + pos == state.row {
                row.style(Style::default().fg(colors.selected).add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    Widget::render(
        Table::new(body, constraints).header(Row::new(header)).column_spacing(1),
        area,
        buf,
    );
}

fn display(value: &Value) -> String {
    if value.is_null() {
        NULL_DISPLAY.to_string()
    } else {
        value.to_string().replace(['\n', '\r'], " ")
    }
}

fn truncate(text: &str, width: u16) -> String {
    let width = width as usize;
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Leftmost column to draw so that `selected` fits in `available` cells.
fn first_column(widths: &[u16], selected: usize, available: u16) -> usize {
    let mut first = selected.min(widths.len().saturating_sub(1));
    let mut used = widths.get(first).copied().unwrap_or(0);
    while first > 0 {
        let need = widths[first - 1] + 1;
        if used + need > available {
            break;
        }
        used += need;
        first -= 1;
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Int(1), Value::Text("alpha".into())],
                vec![Value::Int(2), Value::Null],
            ],
        )
    }

    fn text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_table_shows_headers_and_null() {
        let result = sample();
        let view = ResultView::new();
        let rows = view.visible_rows(&result);
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        let mut state = ResultsState::default();
        ResultsTable::new(ResultsBody::Table {
            result: &result,
            view: &view,
            rows: &rows,
        })
        .render(area, &mut buf, &mut state);
        let out = text(&buf);
        assert!(out.contains("id"));
        assert!(out.contains("alpha"));
        assert!(out.contains("NULL"));
    }

    #[test]
    fn test_cursor_scrolls_window() {
        let mut state = ResultsState::default();
        state.down(10, 7);
        state.scroll_into_view(3);
        assert_eq!(state.offset, 5);
        state.up(6);
        state.scroll_into_view(3);
        assert_eq!(state.offset, 1);
    }

    #[test]
    fn test_first_column_keeps_selection_visible() {
        assert_eq!(first_column(&[10, 10, 10], 2, 25), 1);
        assert_eq!(first_column(&[10, 10, 10], 2, 100), 0);
        assert_eq!(first_column(&[], 0, 10), 0);
    }

    #[test]
    fn test_truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
