use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent};
use intake_core::{AttachmentRef, FormContext, FormController, FormField};
use intake_service::BlockingHttpSubmitter;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{debug, info};

use crate::components::form_view::FormView;

/// What the app is currently doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Moving between fields
    Normal,
    /// Typing into a field
    EditField { field: FormField, input: String },
    /// Typing the path of a document to attach
    AttachPath { input: String },
    /// Submit requested; the event loop runs it after drawing this frame
    Submitting,
    /// Submitted; the confirmation view shows once `until` has passed
    Redirecting { until: Instant },
    /// Static confirmation view
    Confirmation,
}

pub struct App {
    service: BlockingHttpSubmitter,
    controller: FormController,
    form: FormView,
    mode: Mode,
    status_message: Option<String>,
    confirmation_delay: Duration,
    /// Set by handle_key when the user submits.
    /// The event loop checks this and runs the blocking request.
    pub submit_request: bool,
}

impl App {
    pub fn new(
        service: BlockingHttpSubmitter,
        context: FormContext,
        confirmation_delay: Duration,
    ) -> Self {
        Self {
            service,
            controller: FormController::new(context),
            form: FormView::new(),
            mode: Mode::Normal,
            status_message: None,
            confirmation_delay,
            submit_request: false,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn selected_field(&self) -> FormField {
        self.form.selected_field()
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(
            self.mode,
            Mode::EditField { .. } | Mode::AttachPath { .. } | Mode::Submitting
        )
    }

    /// Returns true if the event loop should use a poll timeout instead of blocking.
    pub fn needs_polling(&self) -> bool {
        matches!(self.mode, Mode::Redirecting { .. })
    }

    /// Advance timed transitions. Called on poll timeout from the event loop.
    pub fn tick(&mut self) {
        if let Mode::Redirecting { until } = self.mode {
            if Instant::now() >= until {
                self.mode = Mode::Confirmation;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode.clone() {
            Mode::Normal => self.handle_normal(key),
            Mode::EditField { field, input } => self.handle_edit_field(key, field, input),
            Mode::AttachPath { input } => self.handle_attach_path(key, input),
            // Gate: nothing is accepted while a request is in flight.
            Mode::Submitting => {}
            Mode::Redirecting { .. } => {}
            Mode::Confirmation => self.handle_confirmation(key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        self.status_message = None;
        match key.code {
            KeyCode::Enter | KeyCode::Char('e') => self.start_edit(self.form.selected_field()),
            KeyCode::Char('a') => {
                self.mode = Mode::AttachPath {
                    input: String::new(),
                };
            }
            KeyCode::Char('x') => {
                self.status_message = Some(match self.controller.remove_attachment() {
                    Some(att) => format!("Removed {}", att.name),
                    None => "No document attached".into(),
                });
            }
            KeyCode::Char('s') => {
                self.mode = Mode::Submitting;
                self.submit_request = true;
            }
            _ => self.form.handle_key(key),
        }
    }

    fn start_edit(&mut self, field: FormField) {
        if self.controller.is_read_only(field) {
            self.status_message = Some(format!("{} is read-only", field.display_name()));
            self.mode = Mode::Normal;
            return;
        }
        self.form.select(field);
        self.mode = Mode::EditField {
            field,
            input: self.controller.record().get(field).to_string(),
        };
    }

    fn handle_edit_field(&mut self, key: KeyEvent, field: FormField, mut input: String) {
        match key.code {
            KeyCode::Enter => {
                self.commit_field(field, input);
                self.mode = Mode::Normal;
            }
            KeyCode::Tab => {
                if self.commit_field(field, input) {
                    let mut next = FormView::next_field(field);
                    if self.controller.is_read_only(next) {
                        next = FormView::next_field(next);
                    }
                    self.start_edit(next);
                } else {
                    self.mode = Mode::Normal;
                }
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::EditField { field, input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::EditField { field, input };
            }
            _ => {}
        }
    }

    fn commit_field(&mut self, field: FormField, input: String) -> bool {
        match self.controller.update_field(field, input) {
            Ok(()) => true,
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                false
            }
        }
    }

    fn handle_attach_path(&mut self, key: KeyEvent, mut input: String) {
        match key.code {
            KeyCode::Enter => {
                let path = PathBuf::from(input.trim());
                if !input.trim().is_empty() {
                    let result = AttachmentRef::from_path(&path)
                        .and_then(|att| {
                            let name = att.name.clone();
                            self.controller.select_attachment(att).map(|()| name)
                        });
                    self.status_message = Some(match result {
                        Ok(name) => format!("Attached {name}"),
                        Err(e) => format!("Error: {e}"),
                    });
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::AttachPath { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::AttachPath { input };
            }
            _ => {}
        }
    }

    fn handle_confirmation(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Char('n')) {
            self.status_message = None;
            self.form.select(FormField::FirstName);
            self.mode = Mode::Normal;
        }
    }

    /// Run the pending submission. Blocks until the endpoint answers or the
    /// timeout fires; the form is back in `Idle` either way.
    pub fn run_submission(&mut self) {
        self.submit_request = false;
        match self.service.submit_form(&mut self.controller) {
            Ok(receipt) => {
                info!("submission accepted with status {}", receipt.status);
                let message = receipt
                    .message
                    .unwrap_or_else(|| "Information submitted successfully".into());
                self.status_message = Some(message);
                self.mode = Mode::Redirecting {
                    until: Instant::now() + self.confirmation_delay,
                };
            }
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                if let Some(errors) = e.field_errors() {
                    if let Some(first) = errors.fields().next() {
                        self.form.select(first);
                    }
                }
                self.mode = Mode::Normal;
            }
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        if self.mode == Mode::Confirmation {
            self.render_confirmation(frame, area);
            return;
        }

        let bottom_height = match self.mode {
            Mode::EditField { .. } | Mode::AttachPath { .. } => 3,
            _ => 0,
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(bottom_height),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, chunks[0]);
        let locked = self.controller.is_submitting() || self.mode == Mode::Submitting;
        self.form.render(frame, &self.controller, chunks[1], locked);
        self.form.render_attachment(frame, &self.controller, chunks[2]);

        match &self.mode {
            Mode::EditField { field, input } => {
                self.render_input_bar(frame, field.display_name(), input, chunks[3]);
            }
            Mode::AttachPath { input } => {
                self.render_input_bar(frame, "Document path", input, chunks[3]);
            }
            _ => {}
        }

        self.render_status_bar(frame, chunks[4]);
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(" intake ", Style::default().fg(Color::Black).bg(Color::Cyan).bold()),
            Span::raw(" Complete your information"),
        ]);
        frame.render_widget(Paragraph::new(title), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match (&self.mode, &self.status_message) {
            (Mode::Submitting, _) => (
                "Submitting...".to_string(),
                Style::default().fg(Color::Yellow),
            ),
            (Mode::Redirecting { .. }, Some(msg)) => (
                format!("{msg}  Redirecting..."),
                Style::default().fg(Color::Green),
            ),
            (_, Some(msg)) if msg.starts_with("Error") => {
                (msg.clone(), Style::default().fg(Color::Red))
            }
            (_, Some(msg)) => (msg.clone(), Style::default().fg(Color::Green)),
            (Mode::EditField { .. }, None) => (
                "enter:save  tab:save+next  esc:cancel".to_string(),
                Style::default().fg(Color::DarkGray),
            ),
            (Mode::AttachPath { .. }, None) => (
                "enter:attach  esc:cancel".to_string(),
                Style::default().fg(Color::DarkGray),
            ),
            _ => (
                "j/k:move  enter:edit  a:attach  x:remove  s:submit  q:quit".to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
    }

    fn render_input_bar(&self, frame: &mut Frame, label: &str, input: &str, area: Rect) {
        let block = Block::default()
            .title(format!(" {label} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let paragraph = Paragraph::new(format!("{input}_")).block(block);
        frame.render_widget(paragraph, area);
    }

    fn render_confirmation(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Thank you ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));

        let lines = vec![
            Line::from(Span::styled(
                "Your information has been submitted.",
                Style::default().bold(),
            )),
            Line::from(""),
            Line::from("We will be in touch if anything else is needed."),
            Line::from(""),
            Line::from(Span::styled(
                "n: new submission  q: quit",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Drop input that queued up while a submission blocked the event loop, so a
/// repeated `s` cannot resubmit the moment the request settles.
pub fn discard_pending<P, R>(mut poll: P, mut read: R) -> std::io::Result<usize>
where
    P: FnMut() -> std::io::Result<bool>,
    R: FnMut() -> std::io::Result<Event>,
{
    let mut dropped = 0;
    while poll()? {
        read()?;
        dropped += 1;
    }
    if dropped > 0 {
        debug!("discarded {dropped} events queued during submission");
    }
    Ok(dropped)
}
