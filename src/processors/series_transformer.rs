use crate::models::{DailyEnergyIncrement, EnergyReading, HeatingDegreeRecord};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Anything that falls on a calendar day
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

/// First and last cumulative reading seen on one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySpan {
    pub day: NaiveDate,
    pub first: f64,
    pub last: f64,
    pub readings: usize,
}

impl DailySpan {
    fn open(reading: &EnergyReading) -> Self {
        Self {
            day: reading.timestamp.date(),
            first: reading.cumulative,
            last: reading.cumulative,
            readings: 1,
        }
    }

    /// Energy used during the day; a counter that went backwards counts as zero
    pub fn increment(&self) -> f64 {
        (self.last - self.first).max(0.0)
    }

    /// Whether the counter went backwards within the day (reset or rollback)
    pub fn is_floored(&self) -> bool {
        self.last < self.first
    }
}

/// Group chronologically sorted readings into consecutive calendar days.
/// The last day is always emitted.
pub fn daily_spans(readings: &[EnergyReading]) -> Vec<DailySpan> {
    let mut spans = Vec::new();
    let Some((first, rest)) = readings.split_first() else {
        return spans;
    };

    let mut current = DailySpan::open(first);
    for reading in rest {
        if reading.timestamp.date() == current.day {
            current.last = reading.cumulative;
            current.readings += 1;
        } else {
            spans.push(current);
            current = DailySpan::open(reading);
        }
    }
    spans.push(current);

    spans
}

/// Convert cumulative readings to one non-negative increment per day
pub fn to_daily_increments(readings: &[EnergyReading]) -> Vec<DailyEnergyIncrement> {
    daily_spans(readings)
        .into_iter()
        .map(|span| DailyEnergyIncrement {
            day: span.day,
            increment: span.increment(),
        })
        .collect()
}

/// Monday of the ISO week containing `day`
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Sum values per ISO week, keyed by the week's Monday
pub fn group_by_week<D, I>(series: I) -> BTreeMap<NaiveDate, f64>
where
    D: CalendarDay,
    I: IntoIterator<Item = (D, f64)>,
{
    let mut weekly = BTreeMap::new();
    for (when, value) in series {
        *weekly.entry(week_start(when.calendar_day())).or_insert(0.0) += value;
    }
    weekly
}

/// Map each calendar day to its value; a repeated day keeps the later value
pub fn series_to_map<D, I>(series: I) -> BTreeMap<NaiveDate, f64>
where
    D: CalendarDay,
    I: IntoIterator<Item = (D, f64)>,
{
    series
        .into_iter()
        .map(|(when, value)| (when.calendar_day(), value))
        .collect()
}

/// Heating-degree values by date
pub fn degree_day_map(records: &[HeatingDegreeRecord]) -> BTreeMap<NaiveDate, f64> {
    series_to_map(records.iter().map(|record| (record.date, record.value)))
}
