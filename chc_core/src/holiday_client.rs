//! This client fetches the holiday observances and turns them into calendar events.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use ical::{
    generator::{IcalCalendar, Property},
    ical_property,
};
use reqwest::{header::LAST_MODIFIED, Response};

use crate::{
    event::{parse_date, CalendarEvent},
    table::{self, normalize},
    year::{self, DEFAULT_YEAR_WINDOW},
};

pub static URL: &str = "https://hr.caltech.edu/perks/time_away/holiday_observances";
static PROD_ID: &str = "-//Holiday Observances//hr.caltech.edu";

/// The index of the "Month Day" cell in a normalized row.
const DATE_CELL: usize = 2;
/// The index of the holiday name in a normalized row.
const TITLE_CELL: usize = 3;

/// Where to read the holidays from and how far to look for the years they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub url: String,
    pub year_window: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::from(URL),
            year_window: DEFAULT_YEAR_WINDOW,
        }
    }
}

/// Get the holiday calendar.
pub async fn get(config: &Config) -> Result<IcalCalendar> {
    let response = get_response(&config.url).await?;
    let timestamp = fetch_timestamp(&response)?;
    let html = response
        .text()
        .await
        .with_context(|| format!("could not decode the page {}", config.url))?;
    let calendar = get_calendar(&html, timestamp, config.year_window)?;
    Ok(calendar)
}

/// Get the holiday observances page.
async fn get_response(url: &str) -> Result<Response> {
    log::info!("Fetching {url}");
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("could not fetch {url}"))?
        .error_for_status()?;
    Ok(response)
}

/// The time the page was last modified, or now if the server does not tell.
fn fetch_timestamp(response: &Response) -> Result<DateTime<Utc>> {
    let Some(last_modified) = response.headers().get(LAST_MODIFIED) else {
        log::debug!("No Last-Modified header, using the current time");
        return Ok(Utc::now());
    };
    parse_last_modified(last_modified.to_str()?)
}

/// Parse a header value like `Tue, 02 Jan 2024 03:04:05 GMT`.
fn parse_last_modified(value: &str) -> Result<DateTime<Utc>> {
    let timestamp = DateTime::parse_from_rfc2822(value)
        .with_context(|| format!("invalid Last-Modified header {value:?}"))?;
    Ok(timestamp.with_timezone(&Utc))
}

/// Build the calendar from the holiday observances page.
pub fn get_calendar(
    html: &str,
    timestamp: DateTime<Utc>,
    year_window: u16,
) -> Result<IcalCalendar> {
    let events = get_events(html, timestamp, year_window)?;
    log::info!("Found {} holidays", events.len());
    let mut calendar = IcalCalendar::new();
    calendar.properties = vec![
        ical_property!("VERSION", "2.0"),
        ical_property!("PRODID", PROD_ID),
    ];
    calendar.events = events.iter().map(CalendarEvent::to_ical_event).collect();
    Ok(calendar)
}

/// Pair every table with its year and read one event per dated row.
fn get_events(
    html: &str,
    timestamp: DateTime<Utc>,
    year_window: u16,
) -> Result<Vec<CalendarEvent>> {
    let tables = table::extract(html);
    let years = year::resolve(html, timestamp.year(), year_window);
    log::debug!("Found {} tables and the years {:?}", tables.len(), years);
    year::ensure_one_per_table(tables.len(), &years)?;
    let mut events = vec![];
    for (table, year) in tables.iter().zip(years) {
        for row in table {
            let cells: Vec<&str> = normalize(row).collect();
            let Some(date_cell) = cells.get(DATE_CELL) else {
                log::debug!("Skipping row {cells:?}, it has no date column");
                continue;
            };
            let Some(start) = parse_date(date_cell, year)? else {
                log::debug!("Skipping row {cells:?}, {date_cell:?} is not a date");
                continue;
            };
            let title = cells
                .get(TITLE_CELL)
                .with_context(|| format!("the holiday on {date_cell:?} has no name"))?;
            events.push(CalendarEvent::new(timestamp, start, title)?);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use ical::generator::Emitter;

    use crate::holiday_client::{
        get, get_calendar, get_events, parse_last_modified, Config, PROD_ID, URL,
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Test whether the page can be fetched and the resulting calendar contains something.
    ///
    /// This is an online test!
    #[tokio::test]
    #[ignore]
    async fn test_get() {
        let calendar = get(&Config::default()).await.unwrap();
        assert!(calendar.events.len() > 0);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.url, URL);
        assert_eq!(config.year_window, 10);
    }

    #[test]
    fn test_parse_last_modified() {
        let timestamp = parse_last_modified("Tue, 02 Jan 2024 03:04:05 GMT").unwrap();
        assert_eq!(timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert!(parse_last_modified("yesterday").is_err());
    }

    /// Test whether the page is read correctly.
    ///
    /// This test is offline.
    #[test]
    fn test_get_events() {
        let html = include_str!("holiday_client/tests/holiday_observances.html");
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 3, 17, 30, 0).unwrap();
        let events = get_events(html, timestamp, 10).unwrap();
        let holidays: Vec<(NaiveDate, &str)> = events
            .iter()
            .map(|event| (event.start, event.title.as_str()))
            .collect();
        assert_eq!(
            holidays,
            vec![
                (date(2024, 1, 1), "New Year's Day"),
                (date(2024, 1, 15), "Martin Luther King Jr. Day"),
                (date(2024, 2, 19), "Presidents' Day"),
                (date(2024, 7, 4), "Independence Day"),
                (date(2024, 11, 28), "Thanksgiving Day"),
                (date(2024, 11, 29), "Day after Thanksgiving"),
                (date(2024, 12, 25), "Christmas Day"),
                (date(2025, 1, 1), "New Year's Day"),
                (date(2025, 1, 20), "Martin Luther King Jr. Day"),
                (date(2025, 7, 4), "Independence Day"),
                (date(2025, 12, 25), "Christmas Day"),
            ]
        );
        assert!(events.iter().all(|event| event.timestamp == timestamp));
        assert_eq!(events[6].end, date(2024, 12, 26));
        assert_eq!(events[10].end, date(2025, 12, 26));
    }

    #[test]
    fn test_get_events_fails_on_year_mismatch() {
        let html = include_str!("holiday_client/tests/holiday_observances.html");
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 3, 17, 30, 0).unwrap();
        // only 2024 is in reach, but the page has two tables
        assert!(get_events(html, timestamp, 0).is_err());

        let html = "<p>for 2023, for 2024 and for 2025</p>\
                    <table><tr><td>1</td><td>Monday</td><td>January 1</td><td>New Year's Day</td></tr></table>\
                    <table><tr><td>1</td><td>Wednesday</td><td>January 1</td><td>New Year's Day</td></tr></table>";
        let error = get_events(html, timestamp, 10).unwrap_err();
        assert!(error.to_string().contains("found 2 tables but 3 years"));
    }

    #[test]
    fn test_get_events_fails_on_missing_name() {
        let html = "<h2>Holidays for 2024</h2>\
                    <table><tr><td>1</td><td>Monday</td><td>January 1</td></tr></table>";
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert!(get_events(html, timestamp, 10).is_err());
    }

    #[test]
    fn test_get_events_fails_on_impossible_date() {
        let html = "<h2>Holidays for 2024</h2>\
                    <table><tr><td>1</td><td>Monday</td><td>April 31</td><td>Nothing</td></tr></table>";
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert!(get_events(html, timestamp, 10).is_err());
    }

    #[test]
    fn test_get_calendar() {
        let html = "<h2>Holiday Observances for 2024</h2>\
                    <table><tr><td></td><td>1</td><td> </td><td>Monday</td>\
                    <td>\n January 1 \n</td><td>New Year's Day</td><td></td></tr></table>";
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let calendar = get_calendar(html, timestamp, 10).unwrap();
        assert_eq!(calendar.events.len(), 1);
        let lines: Vec<String> = calendar
            .generate()
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();
        let prod_id = format!("PRODID:{PROD_ID}");
        assert_eq!(
            lines,
            vec![
                "BEGIN:VCALENDAR",
                "VERSION:2.0",
                prod_id.as_str(),
                "BEGIN:VEVENT",
                "DTSTAMP:20240102T030405Z",
                "DTSTART:20240101",
                "DTEND:20240102",
                "SUMMARY:New Year's Day",
                "END:VEVENT",
                "END:VCALENDAR",
            ]
        );
    }

    #[test]
    fn test_get_calendar_without_tables() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let calendar = get_calendar("<p>No holidays announced yet.</p>", timestamp, 10).unwrap();
        assert!(calendar.events.is_empty());
    }

    #[test]
    fn test_get_events_skips_short_rows() {
        let html = "<h2>Holidays for 2024</h2>\
                    <table>\
                    <tr><td colspan=\"4\">Winter Closure</td></tr>\
                    <tr><td>Monday</td><td>January 1</td></tr>\
                    <tr><td>1</td><td>Monday</td><td>January 1</td><td>New Year's Day</td></tr>\
                    </table>";
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let events = get_events(html, timestamp, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, date(2024, 1, 1));
        assert_eq!(events[0].title, "New Year's Day");
    }
}
