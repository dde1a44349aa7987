//! This crate reads Caltech's holiday observances and provides them as an iCalendar.
//!
//! The holidays are read from <https://hr.caltech.edu/perks/time_away/holiday_observances>.

pub use ical;

pub mod event;
pub mod holiday_client;
pub mod table;
pub mod year;
