//! Month grid for the calendar page.

use chrono::{Datelike, Months, NaiveDate};

/// Month names, January first.
const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Column headings; weeks start on Sunday.
pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One cell of the grid. Padding cells before the 1st have no day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub day: Option<u32>,
    pub is_today: bool,
    pub is_selected: bool,
}

/// A month laid out in weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    /// 1-based.
    pub month: u32,
    /// Rows of up to seven cells. The last row is not padded.
    pub weeks: Vec<Vec<DayCell>>,
    pub selected: Option<NaiveDate>,
}

impl MonthGrid {
    /// Lay out `first`'s month, marking `today` and `selected` when they
    /// fall inside it.
    #[must_use]
    pub fn new(first: NaiveDate, today: NaiveDate, selected: Option<NaiveDate>) -> Self {
        let first = first.with_day(1).unwrap_or(first);
        let (year, month) = (first.year(), first.month());
        let days = days_in_month(first);
        let lead = first.weekday().num_days_from_sunday();

        let mut cells: Vec<DayCell> = (0..lead)
            .map(|_| DayCell {
                day: None,
                is_today: false,
                is_selected: false,
            })
            .collect();

        cells.extend((1..=days).map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day);
            DayCell {
                day: Some(day),
                is_today: date == Some(today),
                is_selected: date.is_some() && date == selected,
            }
        }));

        Self {
            year,
            month,
            weeks: cells.chunks(7).map(<[DayCell]>::to_vec).collect(),
            selected,
        }
    }

    /// "June 2024".
    #[must_use]
    pub fn title(&self) -> String {
        let name = self
            .month
            .checked_sub(1)
            .and_then(|i| MONTH_NAMES.get(i as usize))
            .copied()
            .unwrap_or_default();
        format!("{name} {}", self.year)
    }

    /// `(year, month)` of the previous month.
    #[must_use]
    pub fn previous(&self) -> (i32, u32) {
        step(self.first(), false)
    }

    /// `(year, month)` of the next month.
    #[must_use]
    pub fn next(&self) -> (i32, u32) {
        step(self.first(), true)
    }

    fn first(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

/// Number of days in `date`'s month.
fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

fn step(first: NaiveDate, forward: bool) -> (i32, u32) {
    let moved = if forward {
        first.checked_add_months(Months::new(1))
    } else {
        first.checked_sub_months(Months::new(1))
    }
    .unwrap_or(first);
    (moved.year(), moved.month())
}
