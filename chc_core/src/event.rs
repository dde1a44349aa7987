//! This module interprets date cells and builds the calendar events.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use ical::{
    generator::{IcalEvent, Property},
    ical_property,
};

static FORMAT_DATE: &str = "%Y%m%d";
static FORMAT_TIMESTAMP: &str = "%Y%m%dT%H%M%SZ";

static MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Parse a "Month Day" cell like "January 1" into a date of the given year.
///
/// Returns `Ok(None)` if the text is not shaped like a date.
/// A day which is no number, or which does not exist in that month, is an error.
pub fn parse_date(text: &str, year: i32) -> Result<Option<NaiveDate>> {
    let values: Vec<&str> = text.split_whitespace().collect();
    let [month_name, day] = values.as_slice() else {
        return Ok(None);
    };
    let Some(month) = month_number(month_name) else {
        return Ok(None);
    };
    let day: u32 = day
        .parse()
        .with_context(|| format!("invalid day in date cell {text:?}"))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("date cell {text:?} does not exist in {year}"))?;
    Ok(Some(date))
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| *month == name)
        .map(|index| index as u32 + 1)
}

/// Render a date as an iCalendar date, e.g. `20240101`.
pub fn icalendar_date(date: &NaiveDate) -> String {
    date.format(FORMAT_DATE).to_string()
}

/// Render a timestamp as an iCalendar UTC date-time, e.g. `20240102T030405Z`.
pub fn icalendar_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(FORMAT_TIMESTAMP).to_string()
}

/// A single all-day holiday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub timestamp: DateTime<Utc>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub title: String,
}

impl CalendarEvent {
    /// The event ends exclusively on the following day.
    pub fn new(timestamp: DateTime<Utc>, start: NaiveDate, title: &str) -> Result<Self> {
        let end = start
            .succ_opt()
            .with_context(|| format!("{start} has no following day"))?;
        Ok(Self {
            timestamp,
            start,
            end,
            title: title.to_string(),
        })
    }

    pub fn to_ical_event(&self) -> IcalEvent {
        let mut event = IcalEvent::new();
        event.properties = vec![
            ical_property!("DTSTAMP", icalendar_timestamp(&self.timestamp)),
            ical_property!("DTSTART", icalendar_date(&self.start)),
            ical_property!("DTEND", icalendar_date(&self.end)),
            ical_property!("SUMMARY", self.title.clone()),
        ];
        event
    }
}
