//! Weekly batch bookkeeping: batch identifiers, the submission window and
//! the user-facing remaining-capacity report.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::allocator::PlateAllocator;
use crate::config::Settings;

/// Batch identifier for a date: two-digit ISO year followed by the
/// two-digit ISO week, e.g. 2026-W31 -> 2631. Distinguishing across year
/// boundaries, monotonic within the lifetime of the service, and the
/// decimal prefix of every primary key issued for that week.
pub fn batch_week(date: NaiveDate) -> u32 {
    let iso = date.iso_week();
    (iso.year().rem_euclid(100) as u32) * 100 + iso.week()
}

/// Whether samples are still accepted on this weekday. Submissions close
/// after the configured last ISO weekday so the wet lab has the rest of
/// the week to process the plate.
pub fn submission_open(date: NaiveDate, last_submission_day: u32) -> bool {
    date.weekday().number_from_monday() <= last_submission_day
}

/// Remaining capacity as reported to clients, with the status message
/// shown next to the submission form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemainingReport {
    pub remaining: usize,
    pub message: String,
}

pub fn remaining_report(
    allocator: &PlateAllocator,
    settings: &Settings,
    date: NaiveDate,
) -> RemainingReport {
    let mut remaining = allocator.remaining();
    let mut message = String::new();
    if !submission_open(date, settings.last_submission_day) {
        remaining = 0;
        message = String::from("Sample submission is closed for this week.");
    } else if allocator.is_full() {
        message = String::from("All samples have been taken this week.");
    }
    RemainingReport { remaining, message }
}
