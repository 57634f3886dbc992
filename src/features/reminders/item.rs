//! # Reminder Items
//!
//! One scheduled task as written to the store. An item's identity is its start
//! time at second resolution, which also sorts chronologically.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::store::CalendarKey;
use chrono::{Duration, NaiveDateTime};

/// `strftime` pattern for item ids, e.g. `20240101T083000`
pub const ITEM_ID_FORMAT: &str = "%Y%m%dT%H%M%S";

/// File extension of stored items
pub const ITEM_EXTENSION: &str = "ics";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub label: String,
    pub start: NaiveDateTime,
    pub due: NaiveDateTime,
    pub calendar: CalendarKey,
}

impl ReminderItem {
    pub fn new(
        label: impl Into<String>,
        start: NaiveDateTime,
        due_offset: Duration,
        calendar: CalendarKey,
    ) -> Self {
        Self {
            label: label.into(),
            start,
            due: start + due_offset,
            calendar,
        }
    }

    pub fn id(&self) -> String {
        item_id(self.start)
    }

    /// iCalendar document holding this item as a single VTODO
    pub fn render_ics(&self) -> String {
        let time = self.id();
        let due_time = self.due.format(ITEM_ID_FORMAT);
        let label = escape_text(&self.label);

        format!(
            "BEGIN:VCALENDAR\r\n\
             VERSION:2.0\r\n\
             PRODID:-//kappa-dav//EN\r\n\
             BEGIN:VTODO\r\n\
             DESCRIPTION:\r\n\
             DTSTAMP;X-VOBJ-FLOATINGTIME-ALLOWED=TRUE:{time}\r\n\
             DTSTART:{time}\r\n\
             DUE:{due_time}\r\n\
             STATUS:NEEDS-ACTION\r\n\
             SUMMARY:{label}\r\n\
             UID:{time}.{ITEM_EXTENSION}\r\n\
             END:VTODO\r\n\
             END:VCALENDAR\r\n"
        )
    }
}

pub fn item_id(start: NaiveDateTime) -> String {
    start.format(ITEM_ID_FORMAT).to_string()
}

/// Recover the start time from an item id; `None` for foreign ids
pub fn parse_item_id(id: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(id, ITEM_ID_FORMAT).ok()
}

pub fn item_file_name(id: &str) -> String {
    format!("{id}.{ITEM_EXTENSION}")
}

/// Path of an item relative to the store root, as delivered to clients
pub fn item_path(calendar: &CalendarKey, id: &str) -> String {
    format!("{calendar}/{}", item_file_name(id))
}

/// RFC 5545 TEXT escaping for the summary line
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}
