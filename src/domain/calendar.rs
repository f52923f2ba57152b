/*!
 * Calendar Resolver (C2)
 *
 * For a (worker, date) pair, computes the disjoint, sorted list of free
 * intervals on that date, clipped to a query window, following §4.2:
 *
 *   1. base = active weekly rules for D's day_of_week, materialized to
 *      concrete datetimes on D in the shop timezone.
 *   2. subtract recurring breaks for that day_of_week.
 *   3. apply exceptions for D in insertion order (TIME_OFF without times
 *      empties the day; TIME_OFF with times subtracts; EXTRA_WORKING
 *      unions in and re-merges).
 *   4. subtract existing busy blocks intersecting the window.
 *   5. clip to the window.
 *
 * If the worker has no active rule for D's day_of_week, the worker does
 * not work that day and this returns an empty list without inspecting
 * breaks, exceptions, or busy blocks — a day with no base has nothing to
 * subtract from or add to.
 */

use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use super::intervals::{clip, merge, subtract, Interval};
use crate::models::{CalendarException, ExceptionType, RecurringBreak, WeeklyScheduleRule};

/// Turns a `NaiveTime` on date `date` in timezone `tz` into a concrete UTC
/// instant. Returns `None` only for the (practically unreachable for a
/// shop's daytime hours) case of a nonexistent local time during a DST
/// spring-forward gap.
fn localize(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<chrono::DateTime<chrono::Utc>> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Some(dt.with_timezone(&chrono::Utc)),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&chrono::Utc)),
        chrono::LocalResult::None => None,
    }
}

fn rule_interval(date: NaiveDate, tz: Tz, rule: &WeeklyScheduleRule) -> Option<Interval> {
    let start = localize(date, rule.start_time, tz)?;
    let end = localize(date, rule.end_time, tz)?;
    Interval::new(start, end)
}

fn break_interval(date: NaiveDate, tz: Tz, br: &RecurringBreak) -> Option<Interval> {
    let start = localize(date, br.start_time, tz)?;
    let end = localize(date, br.end_time, tz)?;
    Interval::new(start, end)
}

/// Computes free intervals for one worker on one date, per §4.2.
///
/// `rules` and `breaks` must already be filtered to the worker and to D's
/// day_of_week (the repository facade does this filtering at the query
/// layer); `exceptions` must already be filtered to the worker and date D,
/// in insertion order; `busy` are existing AppointmentBlock intervals for
/// this worker intersecting `window`.
pub fn free_intervals(
    date: NaiveDate,
    tz: Tz,
    window: Interval,
    rules: &[WeeklyScheduleRule],
    breaks: &[RecurringBreak],
    exceptions: &[CalendarException],
    busy: &[Interval],
) -> Vec<Interval> {
    let mut base: Vec<Interval> = rules
        .iter()
        .filter(|r| r.active)
        .filter_map(|r| rule_interval(date, tz, r))
        .collect();

    if base.is_empty() {
        // No active rule for this day_of_week: the worker does not work today.
        return Vec::new();
    }
    base = merge(base);

    let break_intervals: Vec<Interval> = breaks
        .iter()
        .filter_map(|b| break_interval(date, tz, b))
        .collect();
    base = subtract(&base, &merge(break_intervals));

    for exc in exceptions {
        if base.is_empty() {
            break;
        }
        match exc.exception_type {
            ExceptionType::TimeOff => {
                if exc.is_full_day_off() {
                    return Vec::new();
                }
                if let (Some(s), Some(e)) = (exc.start_time, exc.end_time) {
                    if let Some(cut) = localize(date, s, tz).zip(localize(date, e, tz)).and_then(
                        |(start, end)| Interval::new(start, end),
                    ) {
                        base = subtract(&base, &[cut]);
                    }
                }
            }
            ExceptionType::ExtraWorking => {
                if let (Some(s), Some(e)) = (exc.start_time, exc.end_time) {
                    if let Some(extra) = localize(date, s, tz).zip(localize(date, e, tz)).and_then(
                        |(start, end)| Interval::new(start, end),
                    ) {
                        base.push(extra);
                        base = merge(base);
                    }
                }
            }
        }
    }

    if base.is_empty() {
        return Vec::new();
    }

    base = subtract(&base, &merge(busy.to_vec()));
    clip(&base, &window)
}
