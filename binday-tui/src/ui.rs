use std::iter;
use std::str::FromStr;

use binday_core::{
    lookup::Fetch,
    model::{BinCollection, BinColor, CollectionSchedule},
    ports::PortError,
};
use chrono::{Local, NaiveDate};
use ratatui::{
    layout::Position,
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;

const CARD_HEIGHT: u16 = 6;
const MAX_VISIBLE_ADDRESSES: usize = 8;
const NO_COLLECTIONS: &str = "There are no upcoming collections schedules for the above address";
const NOTICE_ICON: &str = "⚠";

/// Column a card is placed in; even positions go left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    fn for_position(index: usize) -> Self {
        if index.is_multiple_of(2) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Left cards keep a gap on their right, right cards on their left.
    fn with_margin(self, column: Rect) -> Rect {
        let width = column.width.saturating_sub(1);
        match self {
            Side::Left => Rect { width, ..column },
            Side::Right => Rect {
                x: column.x.saturating_add(1),
                width,
                ..column
            },
        }
    }
}

#[derive(Debug)]
pub(crate) struct Card<'a> {
    pub bin: &'a BinCollection,
    pub side: Side,
}

/// What the schedule region shows.
#[derive(Debug)]
pub(crate) enum SchedulePanel<'a> {
    Hidden,
    /// Only reachable with `show_schedule_errors`
    Unavailable(&'a PortError),
    NoCollections,
    Cards(Vec<Card<'a>>),
}

pub(crate) fn schedule_panel(
    schedule: &Fetch<CollectionSchedule, PortError>,
) -> SchedulePanel<'_> {
    match schedule {
        Fetch::Idle => SchedulePanel::Hidden,
        Fetch::Failed(err) => SchedulePanel::Unavailable(err),
        Fetch::Ready(schedule) if schedule.is_empty() => SchedulePanel::NoCollections,
        Fetch::Ready(schedule) => SchedulePanel::Cards(
            schedule
                .bins
                .iter()
                .enumerate()
                .map(|(index, bin)| Card {
                    bin,
                    side: Side::for_position(index),
                })
                .collect(),
        ),
    }
}

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, postcode, addresses, schedule, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(address_region_height(app)),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [
        header_area,
        postcode_area,
        address_area,
        schedule_area,
        status_area,
    ] = chunks
    else {
        return;
    };

    let header = Paragraph::new("Find out your waste collection day").block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("binday – {}", app.council_name)),
    );
    frame.render_widget(header, *header_area);

    draw_postcode_input(frame, app, *postcode_area);
    draw_addresses(frame, app, *address_area);
    draw_schedule(frame, app, *schedule_area);

    // Status bar
    let nav_hint = "Type a postcode · ↑/↓ choose · Enter select · Esc clear · Ctrl-C quit";

    let (status_text, status_style) = if app.is_loading() {
        (
            format!("Loading… · {nav_hint}"),
            Style::default().fg(Color::Yellow),
        )
    } else {
        (nav_hint.to_owned(), Style::default())
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn address_region_height(app: &App) -> u16 {
    if app.error_message().is_some() {
        return 3;
    }
    let rows = app.addresses().len().clamp(1, MAX_VISIBLE_ADDRESSES);
    u16::try_from(rows).map_or(u16::MAX, |count| count.saturating_add(2))
}

fn draw_postcode_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let input = Paragraph::new(app.postcode.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Enter a postcode"),
    );
    frame.render_widget(input, area);

    let typed = u16::try_from(app.postcode.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position(Position::new(
        area.x.saturating_add(1).saturating_add(typed),
        area.y.saturating_add(1),
    ));
}

fn draw_addresses(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Select an address (↑/↓, Enter)");

    if let Some(message) = app.error_message() {
        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let addresses = app.addresses();
    let selected_uprn = app.selected_address.as_ref().map(|address| address.uprn);

    let items = if addresses.is_empty() {
        vec![ListItem::new("Select an address...").style(Style::default().fg(Color::DarkGray))]
    } else {
        addresses
            .iter()
            .map(|address| {
                let marker = if Some(address.uprn) == selected_uprn {
                    "● "
                } else {
                    "  "
                };
                ListItem::new(format!("{marker}{}", address.label))
            })
            .collect()
    };

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if !addresses.is_empty() {
        state.select(Some(app.address_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_schedule(frame: &mut Frame<'_>, app: &App, area: Rect) {
    match schedule_panel(&app.schedule) {
        SchedulePanel::Hidden => {}
        SchedulePanel::Unavailable(err) => {
            let paragraph =
                Paragraph::new(format!("Could not load the collection schedule: {err}"))
                    .block(Block::default().borders(Borders::ALL).title("Collections"))
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        SchedulePanel::NoCollections => {
            let notice = Line::from(vec![
                Span::styled(format!("{NOTICE_ICON} "), Style::default().fg(Color::Red)),
                Span::styled(NO_COLLECTIONS, Style::default().add_modifier(Modifier::BOLD)),
            ]);
            let paragraph = Paragraph::new(notice)
                .block(Block::default().borders(Borders::ALL).title("Collections"))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        SchedulePanel::Cards(cards) => draw_cards(frame, &cards, area),
    }
}

fn draw_cards(frame: &mut Frame<'_>, cards: &[Card<'_>], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Your next collections");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let row_count = cards.len().div_ceil(2);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            iter::repeat_n(Constraint::Length(CARD_HEIGHT), row_count)
                .chain(iter::once(Constraint::Min(0))),
        )
        .split(inner);

    let today = Local::now().date_naive();

    for (row_area, pair) in rows.iter().zip(cards.chunks(2)) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row_area);

        for card in pair {
            let column = match card.side {
                Side::Left => columns.first(),
                Side::Right => columns.get(1),
            };
            if let Some(column) = column {
                frame.render_widget(card_widget(card.bin, today), card.side.with_margin(*column));
            }
        }
    }
}

fn card_widget(bin: &BinCollection, today: NaiveDate) -> Paragraph<'_> {
    let next = match bin.next_date() {
        Some(date) => format!("{} ({})", bin.next, relative_day_label(date, today)),
        None => bin.next.clone(),
    };

    let mut lines = vec![
        Line::from(bin.category.as_str()),
        Line::from(Span::styled(
            next,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("followed by {}", bin.following)),
    ];
    if let Some(note) = &bin.note {
        lines.push(Line::from(note.as_str()).italic());
    }

    Paragraph::new(lines)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(card_color(&bin.color)),
        )
        .block(Block::default().padding(Padding::uniform(1)))
        .wrap(Wrap { trim: true })
}

fn card_color(color: &BinColor) -> Color {
    if let Some((red, green, blue)) = color.rgb() {
        return Color::Rgb(red, green, blue);
    }
    Color::from_str(color.0.trim()).unwrap_or(Color::DarkGray)
}

fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match delta {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        -1 => "yesterday".to_owned(),
        days => format!("{} days ago", days.abs()),
    }
}
