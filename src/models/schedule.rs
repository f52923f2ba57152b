/*!
 * Calendar Model
 *
 * Weekly schedule rules, recurring breaks and dated calendar exceptions
 * that together define a worker's working calendar (§3, §4.2).
 */

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Day of week, 0=Monday .. 6=Sunday, matching the original source's
/// convention (`staffing.models.WorkerScheduleRule.day_of_week`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i16", into = "i16")]
pub struct DayOfWeek(pub i16);

impl DayOfWeek {
    pub fn from_i16(v: i16) -> Option<Self> {
        if (0..=6).contains(&v) {
            Some(Self(v))
        } else {
            None
        }
    }

    /// Derive from `chrono`'s `Weekday` (Monday-first ISO ordering).
    pub fn from_chrono(w: chrono::Weekday) -> Self {
        use chrono::Weekday::*;
        Self(match w {
            Mon => 0,
            Tue => 1,
            Wed => 2,
            Thu => 3,
            Fri => 4,
            Sat => 5,
            Sun => 6,
        })
    }
}

impl TryFrom<i16> for DayOfWeek {
    type Error = String;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        Self::from_i16(v).ok_or_else(|| format!("day_of_week out of range: {v}"))
    }
}

impl From<DayOfWeek> for i16 {
    fn from(d: DayOfWeek) -> i16 {
        d.0
    }
}

/// (worker, day_of_week, start_time, end_time, active). At most one active
/// rule per (worker, day_of_week); enforced at the storage layer.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WeeklyScheduleRule {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub active: bool,
}

/// (worker, day_of_week, start_time, end_time). Multiple allowed.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RecurringBreak {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    TimeOff,
    ExtraWorking,
}

/// (worker, date, type, optional start_time, optional end_time).
/// TIME_OFF without times means the whole day is off; EXTRA_WORKING
/// requires both times (enforced by `CalendarException::validate_shape`).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CalendarException {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub note: Option<String>,
}

impl CalendarException {
    pub fn validate_shape(&self) -> Result<(), String> {
        match self.exception_type {
            ExceptionType::ExtraWorking => {
                if self.start_time.is_none() || self.end_time.is_none() {
                    return Err("EXTRA_WORKING exceptions require both start_time and end_time".to_string());
                }
            }
            ExceptionType::TimeOff => {
                if self.start_time.is_some() != self.end_time.is_some() {
                    return Err("TIME_OFF exceptions must set both times or neither".to_string());
                }
            }
        }
        Ok(())
    }

    /// Whether this exception zeroes out the entire day (§4.2 step 3).
    pub fn is_full_day_off(&self) -> bool {
        matches!(self.exception_type, ExceptionType::TimeOff) && self.start_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_rejects_out_of_range() {
        assert!(DayOfWeek::from_i16(7).is_none());
        assert!(DayOfWeek::from_i16(-1).is_none());
        assert!(DayOfWeek::from_i16(0).is_some());
        assert!(DayOfWeek::from_i16(6).is_some());
    }

    #[test]
    fn from_chrono_maps_monday_to_zero() {
        assert_eq!(DayOfWeek::from_chrono(chrono::Weekday::Mon).0, 0);
        assert_eq!(DayOfWeek::from_chrono(chrono::Weekday::Sun).0, 6);
    }

    fn exc(t: ExceptionType, start: Option<NaiveTime>, end: Option<NaiveTime>) -> CalendarException {
        CalendarException {
            id: Uuid::nil(),
            worker_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            exception_type: t,
            start_time: start,
            end_time: end,
            note: None,
        }
    }

    #[test]
    fn full_day_time_off_has_no_times() {
        let e = exc(ExceptionType::TimeOff, None, None);
        assert!(e.validate_shape().is_ok());
        assert!(e.is_full_day_off());
    }

    #[test]
    fn extra_working_without_times_is_invalid() {
        let e = exc(ExceptionType::ExtraWorking, None, None);
        assert!(e.validate_shape().is_err());
    }
}
