//! Application state machine and event dispatcher.

use booker_core::{
  ApiError, Error,
  api::ResourceApi,
  coerce::{FieldValue, InputKind},
  controller::{ResourceFormController, SelectionTicket, send_submission},
  form::{FormMode, SchemaState},
  resource::ResourceType,
};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::client::ApiClient;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the resource type list.
  TypeList,
  /// Focus on the resource form.
  Form,
}

/// One focusable row of the form pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
  Name,
  Location,
  Description,
  /// Edit flow only.
  Active,
  /// Index into the controller's schema fields.
  Property(usize),
  Submit,
}

/// Results of API calls running on spawned tasks.
pub enum AppEvent {
  TypesLoaded(Result<Value, ApiError>),
  TypeResolved(SelectionTicket, Result<Value, ApiError>),
  Submitted(Result<Value, ApiError>),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// The create-or-edit session behind the form pane.
  pub form: ResourceFormController<ApiClient>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* type list.
  pub list_cursor: usize,

  /// Cursor position within [`App::rows`].
  pub form_cursor: usize,

  /// Whether keystrokes go into the row under the form cursor.
  pub editing: bool,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Response body of a successful submission; the event loop exits on it.
  pub saved: Option<Value>,

  /// When the type list last loaded successfully.
  pub types_synced: Option<DateTime<Local>>,

  events_tx: mpsc::UnboundedSender<AppEvent>,
  events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
  pub fn new(form: ResourceFormController<ApiClient>) -> Self {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    Self {
      screen: Screen::TypeList,
      form,
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      form_cursor: 0,
      editing: false,
      status_msg: String::new(),
      saved: None,
      types_synced: None,
      events_tx,
      events_rx,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the type list; in the edit flow also resolve the resource's
  /// current type and focus the form.
  pub async fn load(&mut self) {
    self.status_msg = "Loading resource types…".into();
    match self.form.load_resource_types().await {
      Ok(()) => {
        self.status_msg.clear();
        self.types_synced = Some(Local::now());
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }

    if let Some(type_id) = self.form.draft.type_id {
      if let Some(pos) = self.filtered_types().iter().position(|t| t.id == type_id) {
        self.list_cursor = pos;
      }
      self.select(Some(type_id));
      self.screen = Screen::Form;
    }
  }

  /// Apply every result that spawned tasks have delivered so far.
  pub fn drain_events(&mut self) {
    while let Ok(event) = self.events_rx.try_recv() {
      self.handle_event(event);
    }
  }

  fn handle_event(&mut self, event: AppEvent) {
    match event {
      AppEvent::TypesLoaded(response) => {
        match self.form.apply_resource_types(response) {
          Ok(()) => {
            self.status_msg.clear();
            self.types_synced = Some(Local::now());
          }
          Err(e) => self.status_msg = format!("Error: {e}"),
        }
        let len = self.filtered_types().len();
        self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
      }
      AppEvent::TypeResolved(ticket, response) => {
        match self.form.apply_selection(ticket, response) {
          Ok(true) => self.status_msg.clear(),
          Ok(false) => {}
          Err(e) => self.status_msg = format!("Error: {e}"),
        }
        self.clamp_form_cursor();
      }
      AppEvent::Submitted(response) => match self.form.finish_submit(response) {
        Ok(body) => self.saved = Some(body),
        Err(e) => self.status_msg = format!("Error: {e}"),
      },
    }
  }

  // ── Header ────────────────────────────────────────────────────────────────

  /// Flow and type selection, e.g. `booker · edit #9 · Turf`.
  pub fn title(&self) -> String {
    let flow = match self.form.mode() {
      FormMode::Create => "new resource".to_string(),
      FormMode::Edit { resource_id } => format!("edit #{resource_id}"),
    };
    let selection = match self.form.schema_state() {
      SchemaState::NoType => "no type".to_string(),
      SchemaState::Loading { type_id } => format!("type #{type_id}…"),
      SchemaState::Ready { resource_type, .. } => resource_type.display_name().to_string(),
      SchemaState::Error { type_id, .. } => format!("type #{type_id} failed"),
    };
    format!("booker · {flow} · {selection}")
  }

  /// Right-hand header text: the save in flight, or the type list freshness.
  pub fn activity(&self) -> String {
    if self.form.is_submitting() {
      return "saving…".into();
    }
    match self.types_synced {
      Some(at) => format!(
        "{} types · synced {}",
        self.form.resource_types().len(),
        at.format("%H:%M")
      ),
      None => "types not loaded".into(),
    }
  }

  /// Refetch the type list, and the selected type if it failed to resolve.
  fn reload(&mut self) {
    self.status_msg = "Reloading resource types…".into();
    let api = self.form.api();
    let tx = self.events_tx.clone();
    tokio::spawn(async move {
      let response = api.list_resource_types().await;
      tx.send(AppEvent::TypesLoaded(response)).ok();
    });

    if self.form.selection_failed() {
      self.select(self.form.draft.type_id);
    }
  }

  /// Select `type_id` and resolve its schema on a spawned task.
  fn select(&mut self, type_id: Option<i64>) {
    let Some(ticket) = self.form.begin_select(type_id) else {
      return;
    };
    self.status_msg = "Loading schema…".into();
    self.clamp_form_cursor();

    let api = self.form.api();
    let tx = self.events_tx.clone();
    tokio::spawn(async move {
      let response = api.get_resource_type(ticket.type_id).await;
      tx.send(AppEvent::TypeResolved(ticket, response)).ok();
    });
  }

  /// Validate and send the form on a spawned task.
  fn submit(&mut self) {
    match self.form.begin_submit() {
      Ok(submission) => {
        self.status_msg = "Saving…".into();
        let api = self.form.api();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
          let response = send_submission(api.as_ref(), &submission).await;
          tx.send(AppEvent::Submitted(response)).ok();
        });
      }
      Err(Error::Validation(errors)) => {
        self.status_msg = format!("{} field(s) need attention", errors.len());
        if errors.contains_key("type_id") {
          self.screen = Screen::TypeList;
          return;
        }
        let first = self
          .rows()
          .into_iter()
          .position(|row| self.error_key(row).is_some_and(|key| errors.contains_key(&key)));
        if let Some(pos) = first {
          self.form_cursor = pos;
        }
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Returns resource types that match the current filter query.
  pub fn filtered_types(&self) -> Vec<&ResourceType> {
    if self.filter.is_empty() {
      return self.form.resource_types().iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .form
      .resource_types()
      .iter()
      .filter(|t| matcher.fuzzy_match(t.display_name(), &self.filter).is_some())
      .collect()
  }

  /// The type under the list cursor in the filtered view, if any.
  pub fn cursor_type(&self) -> Option<&ResourceType> {
    self.filtered_types().get(self.list_cursor).copied()
  }

  // ── Form rows ─────────────────────────────────────────────────────────────

  pub fn rows(&self) -> Vec<FormRow> {
    let mut rows = vec![FormRow::Name, FormRow::Location, FormRow::Description];
    if matches!(self.form.mode(), FormMode::Edit { .. }) {
      rows.push(FormRow::Active);
    }
    rows.extend((0..self.form.fields().len()).map(FormRow::Property));
    rows.push(FormRow::Submit);
    rows
  }

  pub fn cursor_row(&self) -> FormRow {
    self
      .rows()
      .get(self.form_cursor)
      .copied()
      .unwrap_or(FormRow::Submit)
  }

  /// Key under which validation reports a problem with `row`.
  pub fn error_key(&self, row: FormRow) -> Option<String> {
    match row {
      FormRow::Name => Some("name".into()),
      FormRow::Location => Some("location".into()),
      FormRow::Description => Some("description".into()),
      FormRow::Property(i) => self.form.fields().get(i).map(|f| f.error_key()),
      FormRow::Active | FormRow::Submit => None,
    }
  }

  fn clamp_form_cursor(&mut self) {
    let last = self.rows().len().saturating_sub(1);
    self.form_cursor = self.form_cursor.min(last);
  }

  /// Apply a text edit to `row`, clearing its validation error.
  fn edit_row(&mut self, row: FormRow, edit: impl FnOnce(&mut String)) {
    match row {
      FormRow::Name => {
        edit(&mut self.form.draft.name);
        self.form.clear_error("name");
      }
      FormRow::Location => {
        edit(&mut self.form.draft.location);
        self.form.clear_error("location");
      }
      FormRow::Description => {
        edit(&mut self.form.draft.description);
        self.form.clear_error("description");
      }
      FormRow::Property(i) => {
        let Some(field) = self.form.fields().get(i) else {
          return;
        };
        let FieldValue::Text(text) = &field.value else {
          return;
        };
        let key = field.key.clone();
        let mut text = text.clone();
        edit(&mut text);
        self.form.set_property(&key, FieldValue::Text(text));
      }
      FormRow::Active | FormRow::Submit => {}
    }
  }

  /// Flip a checkbox row. Returns `false` if `row` is not a checkbox.
  fn toggle(&mut self, row: FormRow) -> bool {
    match row {
      FormRow::Active => {
        self.form.draft.is_active = !self.form.draft.is_active;
        self.form.clear_error("is_active");
        true
      }
      FormRow::Property(i) => {
        let Some(field) = self.form.fields().get(i) else {
          return false;
        };
        if field.input_kind() != InputKind::Checkbox {
          return false;
        }
        let next = match &field.value {
          FieldValue::Flag(b) => !b,
          FieldValue::Text(s) => s != "true",
        };
        let key = field.key.clone();
        self.form.set_property(&key, FieldValue::Flag(next))
      }
      _ => false,
    }
  }

  /// Replace the name with the next conventional name for the selected type.
  fn next_suggestion(&mut self) {
    let names = self.form.name_suggestions();
    if names.is_empty() {
      self.status_msg = "No name suggestions for this type".into();
      return;
    }
    let next = names
      .iter()
      .position(|n| *n == self.form.draft.name)
      .map_or(0, |i| (i + 1) % names.len());
    self.form.draft.name = names[next].to_string();
    self.form.clear_error("name");
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return true;
    }
    if self.editing {
      self.handle_edit_key(key);
      return true;
    }

    match self.screen {
      Screen::TypeList => self.handle_list_key(key),
      Screen::Form => self.handle_form_key(key),
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately select if there's exactly one match.
        let only = match self.filtered_types().as_slice() {
          [only] => Some(only.id),
          _ => None,
        };
        if let Some(id) = only {
          self.open_form(id);
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_types().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_type().map(|t| t.id) {
          self.open_form(id);
        }
      }

      // Back to the form without changing the selection.
      KeyCode::Tab => self.screen = Screen::Form,

      // Clear the selection.
      KeyCode::Char('x') => self.select(None),

      KeyCode::Char('r') => self.reload(),

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      _ => {}
    }
    true
  }

  fn handle_form_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
      self.submit();
      return true;
    }

    let row = self.cursor_row();
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Esc | KeyCode::Tab | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::TypeList;
      }

      KeyCode::Down | KeyCode::Char('j') => {
        if self.form_cursor + 1 < self.rows().len() {
          self.form_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.form_cursor = self.form_cursor.saturating_sub(1);
      }

      KeyCode::Char('s') if row == FormRow::Name => self.next_suggestion(),

      KeyCode::Char('r') => self.reload(),

      KeyCode::Char(' ') => {
        self.toggle(row);
      }

      KeyCode::Enter => match row {
        FormRow::Submit => self.submit(),
        row if self.toggle(row) => {}
        _ => self.editing = true,
      },

      _ => {}
    }
    true
  }

  fn handle_edit_key(&mut self, key: KeyEvent) {
    let row = self.cursor_row();
    match key.code {
      KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => self.editing = false,
      KeyCode::Backspace => self.edit_row(row, |s| {
        s.pop();
      }),
      KeyCode::Char(c) => {
        let numeric = match row {
          FormRow::Property(i) => self
            .form
            .fields()
            .get(i)
            .is_some_and(|f| f.input_kind() == InputKind::Number),
          _ => false,
        };
        if numeric && !(c.is_ascii_digit() || c == '-' || c == '.') {
          return;
        }
        self.edit_row(row, |s| s.push(c));
      }
      _ => {}
    }
  }

  /// Select `type_id` unless it is already selected and resolved, then focus
  /// the form.
  fn open_form(&mut self, type_id: i64) {
    if self.form.draft.type_id != Some(type_id) || self.form.selection_failed() {
      self.select(Some(type_id));
    }
    self.screen = Screen::Form;
  }
}
