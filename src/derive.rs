//! Field derivation: turns one template entry plus the run's parameters into
//! the request body for one task.
//!
//! Derivation is deterministic for a given `now`. The only inputs tied to the
//! wall clock are the substitute due date for unparsable entries and the
//! `startDate` of the auto-schedule block, both taken from `now`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use thiserror::Error;

use crate::fields::DeadlineType;
use crate::task::*;

/// Choices fixed for the duration of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParams {
    pub workspace_id: String,
    pub project_id: Option<String>,
    /// Days added to every template due date. May be negative.
    pub offset_days: i64,
    pub schedule: Option<String>,
    pub autoschedule: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeriveError {
    #[error("invalid date {raw}: {reason}")]
    InvalidDate { raw: String, reason: String },
}

/// A derived payload together with the date fault that was absorbed while
/// building it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub payload: TaskPayload,
    pub date_fault: Option<DeriveError>,
}

/// Serialize an instant as ISO-8601 with a literal `Z`.
pub fn format_utc(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`Z` or numeric offset, converted to UTC), naive
/// date-times (taken as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DeriveError> {
    let trimmed = raw.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(t) => Ok(t.with_timezone(&Utc)),
        Err(e) => {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
                return Ok(naive.and_utc());
            }
            if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
            {
                return Ok(midnight.and_utc());
            }
            Err(DeriveError::InvalidDate {
                raw: raw.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Absolute due date for a template entry: its `dueDate` (or the fallback
/// constant) shifted by `offset_days`.
pub fn resolve_due_date(raw: Option<&str>, offset_days: i64) -> Result<DateTime<Utc>, DeriveError> {
    let raw = raw.unwrap_or(FALLBACK_DUE_DATE);
    let base = parse_timestamp(raw)?;
    TimeDelta::try_days(offset_days)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or_else(|| DeriveError::InvalidDate {
            raw: raw.to_string(),
            reason: format!("offset of {} days is out of range", offset_days),
        })
}

/// Auto-schedule block for the run, if one applies.
///
/// An explicitly chosen schedule wins; otherwise the autoschedule flag falls
/// back to [`DEFAULT_SCHEDULE`]. Neither means no block at all.
pub fn auto_schedule(params: &RunParams, now: DateTime<Utc>) -> Option<AutoScheduled> {
    let schedule = match (params.schedule.as_deref().filter(|s| !s.is_empty()), params.autoschedule) {
        (Some(name), _) => name.to_string(),
        (None, true) => DEFAULT_SCHEDULE.to_string(),
        (None, false) => return None,
    };
    Some(AutoScheduled {
        start_date: format_utc(now),
        deadline_type: DeadlineType::Soft,
        schedule,
    })
}

/// Build the creation request for one template entry.
///
/// An unparsable due date is replaced by `now` (without the offset) and
/// reported through [`Derived::date_fault`]; it never fails the task.
pub fn derive_payload(spec: &TaskSpec, params: &RunParams, now: DateTime<Utc>) -> Derived {
    let (due, date_fault) = match resolve_due_date(spec.due_date.as_deref(), params.offset_days) {
        Ok(due) => (due, None),
        Err(e) => (now, Some(e)),
    };

    let payload = TaskPayload {
        name: spec.name.clone(),
        workspace_id: params.workspace_id.clone(),
        due_date: format_utc(due),
        duration: spec.duration.unwrap_or(DEFAULT_DURATION),
        priority: spec.priority,
        project_id: params.project_id.clone().filter(|id| !id.is_empty()),
        auto_scheduled: auto_schedule(params, now),
    };

    Derived { payload, date_fault }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use chrono::TimeZone;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 9, 30, 0).unwrap()
    }

    fn spec(due: Option<&str>) -> TaskSpec {
        TaskSpec {
            name: "Draft agenda".into(),
            workspace_id: None,
            due_date: due.map(str::to_string),
            duration: Some(60),
            priority: Some(Priority::High),
        }
    }

    fn params() -> RunParams {
        RunParams {
            workspace_id: "ws_9".into(),
            ..RunParams::default()
        }
    }

    #[test]
    fn test_offset_shifts_due_date() {
        let mut p = params();
        for (offset, expected) in [
            (0, "2025-03-01T17:00:00Z"),
            (3, "2025-03-04T17:00:00Z"),
            (-2, "2025-02-27T17:00:00Z"),
        ] {
            p.offset_days = offset;
            let derived = derive_payload(&spec(Some("2025-03-01T17:00:00Z")), &p, clock());
            assert_eq!(derived.payload.due_date, expected, "offset {}", offset);
            assert!(derived.date_fault.is_none());
        }
    }

    #[test]
    fn test_missing_due_date_uses_fallback() {
        let mut p = params();
        p.offset_days = 1;
        let derived = derive_payload(&spec(None), &p, clock());
        assert_eq!(derived.payload.due_date, "2025-01-01T23:59:59Z");
    }

    #[test]
    fn test_numeric_offset_is_normalised_to_z() {
        let derived = derive_payload(&spec(Some("2025-03-01T17:00:00+02:00")), &params(), clock());
        assert_eq!(derived.payload.due_date, "2025-03-01T15:00:00Z");
    }

    #[test]
    fn test_fractional_seconds_survive() {
        let derived = derive_payload(&spec(Some("2025-03-01T17:00:00.250Z")), &params(), clock());
        assert_eq!(derived.payload.due_date, "2025-03-01T17:00:00.250Z");
    }

    #[test]
    fn test_naive_and_date_only_inputs() {
        assert_eq!(
            format_utc(parse_timestamp("2025-03-01T17:00:00").unwrap()),
            "2025-03-01T17:00:00Z"
        );
        assert_eq!(format_utc(parse_timestamp("2025-03-01").unwrap()), "2025-03-01T00:00:00Z");
    }

    #[test]
    fn test_invalid_date_falls_back_to_now() {
        let mut p = params();
        p.offset_days = 3;
        let derived = derive_payload(&spec(Some("not-a-date")), &p, clock());
        assert_eq!(derived.payload.due_date, "2025-02-10T09:30:00Z");
        match derived.date_fault {
            Some(DeriveError::InvalidDate { raw, .. }) => assert_eq!(raw, "not-a-date"),
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_offset_is_a_date_fault() {
        let mut p = params();
        p.offset_days = i64::MAX;
        let derived = derive_payload(&spec(Some("2025-03-01T17:00:00Z")), &p, clock());
        assert!(derived.date_fault.is_some());
        assert_eq!(derived.payload.due_date, "2025-02-10T09:30:00Z");
    }

    #[test]
    fn test_pass_through_and_defaults() {
        let mut s = spec(None);
        s.duration = None;
        s.priority = None;
        let derived = derive_payload(&s, &params(), clock());
        assert_eq!(derived.payload.name, "Draft agenda");
        assert_eq!(derived.payload.workspace_id, "ws_9");
        assert_eq!(derived.payload.duration, DEFAULT_DURATION);
        assert_eq!(derived.payload.priority, None);
    }

    #[test]
    fn test_project_id_attached_only_when_present() {
        let mut p = params();
        assert!(derive_payload(&spec(None), &p, clock()).payload.project_id.is_none());
        p.project_id = Some(String::new());
        assert!(derive_payload(&spec(None), &p, clock()).payload.project_id.is_none());
        p.project_id = Some("proj_1".into());
        assert_eq!(
            derive_payload(&spec(None), &p, clock()).payload.project_id.as_deref(),
            Some("proj_1")
        );
    }

    #[test]
    fn test_schedule_precedence() {
        let mut p = params();
        assert!(auto_schedule(&p, clock()).is_none());

        p.autoschedule = true;
        let block = auto_schedule(&p, clock()).unwrap();
        assert_eq!(block.schedule, "Work Hours");
        assert_eq!(block.deadline_type, DeadlineType::Soft);
        assert_eq!(block.start_date, "2025-02-10T09:30:00Z");

        p.schedule = Some("Evenings".into());
        assert_eq!(auto_schedule(&p, clock()).unwrap().schedule, "Evenings");

        p.autoschedule = false;
        assert_eq!(auto_schedule(&p, clock()).unwrap().schedule, "Evenings");
    }

    #[test]
    fn test_derivation_is_repeatable_for_fixed_clock() {
        let mut p = params();
        p.autoschedule = true;
        p.offset_days = 7;
        let a = serde_json::to_vec(&derive_payload(&spec(Some("2025-03-01T17:00:00Z")), &p, clock()).payload).unwrap();
        let b = serde_json::to_vec(&derive_payload(&spec(Some("2025-03-01T17:00:00Z")), &p, clock()).payload).unwrap();
        assert_eq!(a, b);
    }
}
