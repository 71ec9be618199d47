use crossterm::event::{KeyCode, KeyEvent};
use intake_core::{FormController, FormField};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Field list with a cursor. Values and errors are read from the controller
/// at render time; this component only owns the selection.
pub struct FormView {
    list_state: ListState,
}

impl Default for FormView {
    fn default() -> Self {
        Self::new()
    }
}

impl FormView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state }
    }

    pub fn selected_field(&self) -> FormField {
        let idx = self.list_state.selected().unwrap_or(0);
        FormField::ALL[idx.min(FormField::ALL.len() - 1)]
    }

    pub fn select(&mut self, field: FormField) {
        let idx = FormField::ALL.iter().position(|f| *f == field);
        self.list_state.select(idx);
    }

    /// The field after `field`, wrapping around.
    pub fn next_field(field: FormField) -> FormField {
        let idx = FormField::ALL.iter().position(|f| *f == field).unwrap_or(0);
        FormField::ALL[(idx + 1) % FormField::ALL.len()]
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let current = self.list_state.selected().unwrap_or(0);
        let last = FormField::ALL.len() - 1;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if current < last {
                    self.list_state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if current > 0 {
                    self.list_state.select(Some(current - 1));
                }
            }
            KeyCode::Char('g') => self.list_state.select(Some(0)),
            KeyCode::Char('G') => self.list_state.select(Some(last)),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, controller: &FormController, area: Rect, locked: bool) {
        let border_style = if locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let block = Block::default()
            .title(" Your information ")
            .borders(Borders::ALL)
            .border_style(border_style);

        let items: Vec<ListItem> = FormField::ALL
            .iter()
            .map(|&field| field_item(controller, field))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }

    pub fn render_attachment(&self, frame: &mut Frame, controller: &FormController, area: Rect) {
        let block = Block::default()
            .title(" Supporting document (optional) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let line = match controller.attachment() {
            Some(att) => Line::from(vec![
                Span::styled(&att.name, Style::default().bold()),
                Span::styled(
                    format!("  {}  {}", att.content_type, human_size(att.size_bytes())),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            None => Line::from(Span::styled(
                "none  (a: attach pdf/doc/docx/txt/jpg/png up to 10 MiB)",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

fn field_item(controller: &FormController, field: FormField) -> ListItem<'static> {
    let value = controller.record().get(field).to_string();
    let mut spans = vec![Span::styled(
        format!("{:<11}", field.display_name()),
        Style::default().bold(),
    )];
    if value.is_empty() {
        spans.push(Span::styled("(empty)", Style::default().fg(Color::DarkGray)));
    } else {
        spans.push(Span::raw(value));
    }
    if controller.is_read_only(field) {
        spans.push(Span::styled(" [read-only]", Style::default().fg(Color::DarkGray)));
    }
    if controller.was_flagged_missing(field) {
        spans.push(Span::styled(" [missing]", Style::default().fg(Color::Yellow)));
    }

    let mut lines = vec![Line::from(spans)];
    if let Some(message) = controller.errors().get(field) {
        lines.push(Line::from(Span::styled(
            format!("  {message}"),
            Style::default().fg(Color::Red),
        )));
    }
    ListItem::new(lines)
}

fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn starts_on_first_field() {
        assert_eq!(FormView::new().selected_field(), FormField::FirstName);
    }

    #[test]
    fn navigation_clamps_at_edges() {
        let mut view = FormView::new();
        view.handle_key(key(KeyCode::Up));
        assert_eq!(view.selected_field(), FormField::FirstName);

        view.handle_key(key(KeyCode::Char('G')));
        assert_eq!(view.selected_field(), FormField::Address);
        view.handle_key(key(KeyCode::Down));
        assert_eq!(view.selected_field(), FormField::Address);

        view.handle_key(key(KeyCode::Char('k')));
        assert_eq!(view.selected_field(), FormField::Phone);
        view.handle_key(key(KeyCode::Char('g')));
        assert_eq!(view.selected_field(), FormField::FirstName);
    }

    #[test]
    fn next_field_wraps() {
        assert_eq!(FormView::next_field(FormField::FirstName), FormField::LastName);
        assert_eq!(FormView::next_field(FormField::Address), FormField::FirstName);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
