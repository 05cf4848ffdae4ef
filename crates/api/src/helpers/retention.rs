//! Cohort retention over raw activity rows.
//!
//! Subjects are bucketed into cohorts by the period of their first observed
//! activity; for every later period a cohort member was active in, the cohort
//! x offset cell counts them. The whole computation is pure and runs on an
//! immutable snapshot, so it is safe to invoke concurrently and yields
//! identical output for identical input.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use api_types::RetentionCell;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use clickhouse_lib::{ActivityRow, Granularity};

/// One observed action by a subject. `occurred_at` is `None` when the source
/// row carried no usable timestamp; such events are dropped per-record
/// instead of failing the whole computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    /// Stable subject identifier (e.g. a sender address)
    pub subject_id: String,
    /// When the activity happened, if known
    pub occurred_at: Option<DateTime<Utc>>,
}

impl From<ActivityRow> for ActivityEvent {
    fn from(row: ActivityRow) -> Self {
        // timestamp_opt never yields an ambiguous instant for UTC; a row
        // outside the representable range maps to None and gets dropped.
        let occurred_at = Utc.timestamp_opt(i64::from(row.period_ts), 0).single();
        Self { subject_id: row.sender, occurred_at }
    }
}

/// Truncate `date` to the start of its period.
pub fn truncate_to_period(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        // Day 1 exists in every month of a valid date.
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Count whole periods between two period-start dates, calendar-aware.
/// Both arguments must already be truncated with [`truncate_to_period`].
pub fn periods_between(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> i64 {
    match granularity {
        Granularity::Day => (end - start).num_days(),
        Granularity::Week => (end - start).num_days() / 7,
        Granularity::Month => {
            i64::from(end.year() - start.year()) * 12
                + (i64::from(end.month()) - i64::from(start.month()))
        }
    }
}

/// Compute the cohort retention matrix as of the current date.
///
/// `lookback` bounds which cohorts are reported, counted in periods back from
/// (and excluding) the current incomplete period; `None` uses the
/// per-granularity default.
pub fn retention_matrix(
    events: impl IntoIterator<Item = ActivityEvent>,
    granularity: Granularity,
    lookback: Option<u32>,
) -> Vec<RetentionCell> {
    retention_matrix_at(events, granularity, lookback, Utc::now().date_naive())
}

/// [`retention_matrix`] with an injected clock, for deterministic windows.
pub fn retention_matrix_at(
    events: impl IntoIterator<Item = ActivityEvent>,
    granularity: Granularity,
    lookback: Option<u32>,
    as_of: NaiveDate,
) -> Vec<RetentionCell> {
    let lookback = i64::from(lookback.unwrap_or(granularity.default_lookback()));
    let current_period = truncate_to_period(as_of, granularity);

    // Pass 1: distinct active periods per subject. The earliest one is the
    // subject's cohort assignment.
    let mut periods_by_subject: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();
    for event in events {
        let Some(ts) = event.occurred_at else { continue };
        let period = truncate_to_period(ts.date_naive(), granularity);
        periods_by_subject.entry(event.subject_id).or_default().insert(period);
    }

    // Pass 2: cohort sizes and distinct-active counts per (cohort, offset).
    let mut cohort_sizes: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut active: BTreeMap<(NaiveDate, i64), u64> = BTreeMap::new();
    for periods in periods_by_subject.into_values() {
        let Some(&cohort) = periods.first() else { continue };
        let age = periods_between(cohort, current_period, granularity);
        // Only cohorts within the last `lookback` complete periods; the
        // current period is still accruing and never defines a cohort.
        if age < 1 || age > lookback {
            continue;
        }
        *cohort_sizes.entry(cohort).or_default() += 1;
        for period in periods {
            let offset = periods_between(cohort, period, granularity);
            *active.entry((cohort, offset)).or_default() += 1;
        }
    }

    active
        .into_iter()
        .map(|((cohort_period, offset), active_subjects)| {
            let cohort_size = cohort_sizes[&cohort_period];
            RetentionCell {
                cohort_period,
                cohort_size,
                period_offset: offset as u32,
                active_subjects,
                percentage: percentage(active_subjects, cohort_size),
            }
        })
        .collect()
}

/// `active / size * 100`, rounded to 2 decimals. `size` is never zero: a
/// cohort only exists because at least one subject was assigned to it.
fn percentage(active: u64, size: u64) -> f64 {
    (active as f64 / size as f64 * 100.0 * 100.0).round() / 100.0
}
