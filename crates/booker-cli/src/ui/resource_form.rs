//! Resource form pane (right panel).

use booker_core::{coerce::FieldValue, form::SchemaState};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, FormRow, Screen};

const LABEL_WIDTH: usize = 24;

// ─── Public entry ─────────────────────────────────────────────────────────────

/// Render the form pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let border = if app.screen == Screen::Form {
    Color::Cyan
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(" Resource ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines: Vec<Line> = Vec::new();

  if let Some(banner) = app.form.banner() {
    lines.push(Line::from(Span::styled(
      banner.to_string(),
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
  }

  lines.push(type_line(app));
  lines.push(Line::from(""));

  let mut cursor_line = 0;
  for (i, row) in app.rows().into_iter().enumerate() {
    let is_cursor = app.screen == Screen::Form && i == app.form_cursor;
    if is_cursor {
      cursor_line = lines.len();
    }
    lines.push(row_line(app, row, is_cursor));

    if row == FormRow::Name {
      let names = app.form.name_suggestions();
      if !names.is_empty() {
        lines.push(hint_line(&format!("suggestions: {}", names.join(", "))));
      }
    }

    let error = app
      .error_key(row)
      .and_then(|key| app.form.errors().get(&key));
    if let Some(message) = error {
      lines.push(Line::from(Span::styled(
        format!("{:LABEL_WIDTH$}↳ {message}", ""),
        Style::default().fg(Color::Red),
      )));
    }
  }

  // Keep the cursor row in view.
  let height = usize::from(inner.height).max(1);
  let scroll = cursor_line.saturating_sub(height - 1) as u16;
  f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

// ─── Line builders ────────────────────────────────────────────────────────────

fn type_line(app: &App) -> Line<'static> {
  let label = Span::styled(
    format!("{:<LABEL_WIDTH$}", "Type"),
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
  );
  let value = match app.form.schema_state() {
    SchemaState::NoType => Span::styled(
      "select a type in the left pane",
      Style::default().fg(Color::DarkGray),
    ),
    SchemaState::Loading { type_id } => Span::styled(
      format!("loading type #{type_id}…"),
      Style::default().fg(Color::Yellow),
    ),
    SchemaState::Ready { resource_type, .. } => Span::raw(resource_type.display_name().to_string()),
    SchemaState::Error { type_id, .. } => Span::styled(
      format!("type #{type_id} unavailable"),
      Style::default().fg(Color::Red),
    ),
  };
  Line::from(vec![label, value])
}

fn row_line(app: &App, row: FormRow, is_cursor: bool) -> Line<'static> {
  let (label, value) = match row {
    FormRow::Name => ("Name".to_string(), app.form.draft.name.clone()),
    FormRow::Location => ("Location".to_string(), app.form.draft.location.clone()),
    FormRow::Description => ("Description".to_string(), app.form.draft.description.clone()),
    FormRow::Active => ("Active".to_string(), checkbox(app.form.draft.is_active)),
    FormRow::Property(i) => match app.form.fields().get(i) {
      Some(field) => {
        let value = match &field.value {
          FieldValue::Flag(b) => checkbox(*b),
          FieldValue::Text(s) => s.clone(),
        };
        (field.label(), value)
      }
      None => (String::new(), String::new()),
    },
    FormRow::Submit => {
      let text = if app.form.is_submitting() {
        "[ Saving… ]"
      } else {
        "[ Save ]"
      };
      return Line::from(Span::styled(text, cursor_style(is_cursor)));
    }
  };

  let value = if is_cursor && app.editing {
    format!("{value}_")
  } else {
    value
  };

  Line::from(vec![
    Span::styled(
      format!("{label:<LABEL_WIDTH$}"),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::styled(value, cursor_style(is_cursor)),
  ])
}

fn hint_line(text: &str) -> Line<'static> {
  Line::from(Span::styled(
    format!("{:LABEL_WIDTH$}{text}", ""),
    Style::default().fg(Color::DarkGray),
  ))
}

fn checkbox(checked: bool) -> String {
  if checked { "[x]" } else { "[ ]" }.to_string()
}

fn cursor_style(is_cursor: bool) -> Style {
  if is_cursor {
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default()
  }
}
