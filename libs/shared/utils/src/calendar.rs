use chrono::{Datelike, NaiveDate};

use crate::dates::DateError;

/// Lays a month out the way the schedule page draws it: rows of seven
/// cells starting on Sunday, with `None` padding before the 1st and after
/// the last day. `month0` is zero-based, January is 0.
pub fn month_grid(year: i32, month0: u32) -> Result<Vec<Vec<Option<u32>>>, DateError> {
    if month0 > 11 {
        return Err(DateError::BadMonth(month0));
    }
    let month = month0 + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(DateError::BadMonth(month0))?;

    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(DateError::BadMonth(month0))?;
    let days = next_first.pred_opt().ok_or(DateError::BadMonth(month0))?.day();

    let lead = first.weekday().num_days_from_sunday() as usize;
    let mut cells: Vec<Option<u32>> = vec![None; lead];
    cells.extend((1..=days).map(Some));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    Ok(cells.chunks(7).map(|week| week.to_vec()).collect())
}
