//! Terminal rendering of the suggestion list
//!
//! Draws a [`SuggestionList`] as a bordered popup anchored at the list's
//! placement, with the matched part of each label highlighted and the focused
//! entry shaded.

use crate::list::{ListEntry, SegmentKind, SuggestionList};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

/// Suggestion popup widget configuration
#[derive(Debug, Clone)]
pub struct SuggestionListWidgetConfig {
    /// Maximum height in lines, borders included
    pub max_height: u16,
    /// Maximum width
    pub max_width: u16,
    /// Placement units per terminal column
    pub cell_width: f32,
    /// Placement units per terminal row
    pub cell_height: f32,
    pub bg_color: Color,
    pub border_color: Color,
    /// Focused entry background
    pub focused_bg: Color,
    pub text_color: Color,
    /// Matched label segment
    pub match_color: Color,
}

impl Default for SuggestionListWidgetConfig {
    fn default() -> Self {
        Self {
            max_height: 10,
            max_width: 40,
            cell_width: 1.0,
            cell_height: 1.0,
            bg_color: Color::Rgb(30, 30, 46),
            border_color: Color::Rgb(88, 91, 112),
            focused_bg: Color::Rgb(49, 50, 68),
            text_color: Color::White,
            match_color: Color::Yellow,
        }
    }
}

/// Suggestion popup widget
#[derive(Debug, Clone, Default)]
pub struct SuggestionListWidget {
    config: SuggestionListWidgetConfig,
}

impl SuggestionListWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SuggestionListWidgetConfig) -> Self {
        Self { config }
    }

    fn render_entry<'a>(&self, entry: &'a ListEntry, focused: bool) -> ListItem<'a> {
        let spans: Vec<Span<'a>> = entry
            .segments
            .iter()
            .map(|segment| match segment.kind {
                SegmentKind::Matched => Span::styled(
                    segment.text.as_str(),
                    Style::default()
                        .fg(self.config.match_color)
                        .add_modifier(Modifier::BOLD),
                ),
                SegmentKind::Unmatched => Span::styled(
                    segment.text.as_str(),
                    Style::default().fg(self.config.text_color),
                ),
            })
            .collect();

        let style = if focused {
            Style::default().bg(self.config.focused_bg)
        } else {
            Style::default()
        };

        ListItem::new(Line::from(spans)).style(style)
    }

    /// Popup area inside `area`, shifted left or up when it would overflow
    fn popup_rect(&self, list: &SuggestionList, area: Rect) -> Rect {
        let placement = list.placement();
        let col = (placement.left / self.config.cell_width).max(0.0) as u16;
        let row = (placement.top / self.config.cell_height).max(0.0) as u16;

        let height = u16::try_from(list.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(self.config.max_height)
            .min(area.height);
        let width = self.config.max_width.min(area.width);

        let x = area.x + col.min(area.width - width);
        let y = area.y + row.min(area.height - height);

        Rect::new(x, y, width, height)
    }
}

impl StatefulWidget for SuggestionListWidget {
    type State = SuggestionList;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if !state.is_visible() || state.is_empty() || area.is_empty() {
            return;
        }

        let popup = self.popup_rect(state, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.config.border_color))
            .style(Style::default().bg(self.config.bg_color));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let focused = state.focused();
        let items: Vec<ListItem> = state
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| self.render_entry(entry, focused == Some(i)))
            .collect();

        let mut list_state = ListState::default();
        list_state.select(focused);
        StatefulWidget::render(List::new(items), inner, buf, &mut list_state);
    }
}
