//! Resource type list pane (left panel).

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Screen};

/// Render the type list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_types();
  let total = app.form.resource_types().len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Types ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Types ({total}) ")
  };

  let border = if app.screen == Screen::TypeList {
    Color::Cyan
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if let Some(message) = app.form.types_error() {
    f.render_widget(
      Paragraph::new(message).style(Style::default().fg(Color::Red)),
      inner_area,
    );
    return;
  }

  let selected = app.form.draft.type_id;
  let items: Vec<ListItem> = filtered
    .iter()
    .map(|resource_type| {
      let marker = if selected == Some(resource_type.id) { "● " } else { "  " };
      ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Green)),
        Span::raw(resource_type.display_name().to_string()),
      ]))
    })
    .collect();

  // If filter is active or set, show a filter bar at the bottom of the inner area.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let type_error = app.form.errors().get("type_id").filter(|_| inner_area.height > 1);
  if let Some(message) = type_error {
    let error_area = Rect {
      y: inner_area.y + inner_area.height - 1,
      height: 1,
      ..inner_area
    };
    inner_area.height = inner_area.height.saturating_sub(1);
    f.render_widget(
      Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
      error_area,
    );
  }

  // Scrollable list with cursor tracking.
  let mut state = ListState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.list_cursor)
  });

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol(""),
    inner_area,
    &mut state,
  );
}
