//! Service calendars: which dates does a trip operate on?
//!
//! A calendar is a 7-bit weekday mask plus an inclusive validity range.
//! Every trip references exactly one calendar, and this module is the
//! single source of truth for "does this trip run today": boards and
//! the collision detector both go through [`Calendar::runs_on_date`]
//! before treating a stop as live.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ids::ServiceId;

/// A 7-bit weekday applicability mask, bit 0 = Monday .. bit 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdayMask(pub u8);

impl WeekdayMask {
    pub const MONDAY: WeekdayMask = WeekdayMask(1 << 0);
    pub const TUESDAY: WeekdayMask = WeekdayMask(1 << 1);
    pub const WEDNESDAY: WeekdayMask = WeekdayMask(1 << 2);
    pub const THURSDAY: WeekdayMask = WeekdayMask(1 << 3);
    pub const FRIDAY: WeekdayMask = WeekdayMask(1 << 4);
    pub const SATURDAY: WeekdayMask = WeekdayMask(1 << 5);
    pub const SUNDAY: WeekdayMask = WeekdayMask(1 << 6);

    /// Monday through Friday.
    pub const WEEKDAYS: WeekdayMask = WeekdayMask(0b001_1111);

    /// Every day of the week.
    pub const DAILY: WeekdayMask = WeekdayMask(0b111_1111);

    /// Whether the bit for `date`'s weekday is set.
    pub fn contains(self, date: NaiveDate) -> bool {
        let bit = date.weekday().num_days_from_monday();
        self.0 & (1 << bit) != 0
    }
}

/// A service pattern: weekday mask plus inclusive validity date range.
///
/// Shared by all trips of the same pattern. Calendars are configuration
/// data, edited by out-of-scope administrative flows; the core only
/// reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub service_id: ServiceId,
    pub weekdays: WeekdayMask,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Calendar {
    /// Does a trip governed by this calendar operate on `date`?
    ///
    /// Returns false outside `[start_date, end_date]` (inclusive),
    /// otherwise checks the weekday bit.
    pub fn runs_on_date(&self, date: NaiveDate) -> bool {
        if date < self.start_date || date > self.end_date {
            return false;
        }
        self.weekdays.contains(date)
    }
}
