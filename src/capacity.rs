//! Per-day visitor capacity accounting.
//!
//! Everything here is pure arithmetic over a reservation list that was fetched
//! elsewhere. The same functions back the planner's pre-check and the
//! server's check at insert time.

use std::ops::RangeInclusive;
use time::Date;

/// Maximum number of visitors the shelter admits on a single day.
pub const DAILY_CAPACITY: u32 = 100;

/// Party sizes offered by the booking flow.
pub const PARTY_SIZES: RangeInclusive<u32> = 1..=5;

/// Anything that occupies places on a given day.
pub trait DayBooking {
    fn day(&self) -> Date;
    fn visitor_count(&self) -> u32;
}

impl<T: DayBooking + ?Sized> DayBooking for &T {
    fn day(&self) -> Date {
        (**self).day()
    }

    fn visitor_count(&self) -> u32 {
        (**self).visitor_count()
    }
}

impl DayBooking for (Date, u32) {
    fn day(&self) -> Date {
        self.0
    }

    fn visitor_count(&self) -> u32 {
        self.1
    }
}

/// Sum of visitors already booked on `date`, 0 when nothing is booked.
pub fn booked_count<R: DayBooking>(reservations: &[R], date: Date) -> u32 {
    reservations
        .iter()
        .filter(|r| r.day() == date)
        .fold(0u32, |total, r| total.saturating_add(r.visitor_count()))
}

/// Whether `proposed` more visitors still fit on `date`.
pub fn can_book<R: DayBooking>(reservations: &[R], date: Date, proposed: u32) -> bool {
    booked_count(reservations, date)
        .checked_add(proposed)
        .map_or(false, |total| total <= DAILY_CAPACITY)
}

pub fn remaining<R: DayBooking>(reservations: &[R], date: Date) -> u32 {
    DAILY_CAPACITY.saturating_sub(booked_count(reservations, date))
}

pub fn is_party_size(count: u32) -> bool {
    PARTY_SIZES.contains(&count)
}

/// Party sizes that can still be booked on `date`, smallest first.
pub fn offered_party_sizes<R: DayBooking>(reservations: &[R], date: Date) -> Vec<u32> {
    PARTY_SIZES
        .filter(|&size| can_book(reservations, date, size))
        .collect()
}
