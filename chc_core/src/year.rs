//! This module resolves which calendar year each table of the page lists.

use anyhow::{ensure, Result};

/// The default number of years searched on each side of the center year.
pub const DEFAULT_YEAR_WINDOW: u16 = 10;

/// Find every year around `center` for which the page announces a schedule, e.g. "Holidays for 2024".
///
/// The years are returned in ascending order.
pub fn resolve(page: &str, center: i32, window: u16) -> Vec<i32> {
    let page = page.to_lowercase();
    let window = i32::from(window);
    (center.saturating_sub(window)..=center.saturating_add(window))
        .filter(|year| page.contains(&format!("for {year}")))
        .collect()
}

/// Ensure that every extracted table has exactly one resolved year.
pub fn ensure_one_per_table(table_count: usize, years: &[i32]) -> Result<()> {
    ensure!(
        table_count == years.len(),
        "the page layout changed: found {} tables but {} years ({:?})",
        table_count,
        years.len(),
        years
    );
    Ok(())
}
