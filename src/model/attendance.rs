use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum PunchType {
    #[serde(rename = "IN")]
    #[strum(serialize = "IN")]
    In,
    #[serde(rename = "OUT")]
    #[strum(serialize = "OUT")]
    Out,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(rename = "WFH")]
    #[strum(serialize = "WFH")]
    Wfh,
    OnDuty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Gps {
    pub lat: f64,
    pub lon: f64,
}

/// A single timestamped IN/OUT event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Punch {
    #[serde(rename = "type")]
    pub punch_type: PunchType,
    #[schema(value_type = String, format = "date-time")]
    pub time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<Gps>,
}

/// One attendance document per (user, calendar date).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Vec<Punch>)]
    pub punches: Json<Vec<Punch>>,
    pub total_hours: Option<f64>,
    #[schema(example = "Present")]
    pub status: String,
}

/// Punch types toggle off the last recorded punch; an empty day starts with IN.
/// Nothing else constrains the sequence.
pub fn next_punch_type(punches: &[Punch]) -> PunchType {
    match punches.last() {
        Some(last) if last.punch_type == PunchType::In => PunchType::Out,
        _ => PunchType::In,
    }
}

/// Pairs punches at fixed even/odd offsets: (0,1), (2,3), ...
/// A pair contributes time only when it is exactly IN followed by OUT;
/// anything else at those offsets is skipped. An odd trailing punch never
/// counts.
pub fn positional_hours(punches: &[Punch]) -> f64 {
    let mut total_ms: i64 = 0;
    for pair in punches.chunks(2) {
        if let [first, second] = pair {
            if first.punch_type == PunchType::In && second.punch_type == PunchType::Out {
                total_ms += (second.time - first.time).num_milliseconds();
            }
        }
    }
    total_ms as f64 / MS_PER_HOUR
}

/// Stack-style reconciliation: each OUT closes the most recent unmatched IN.
/// Repeated INs keep only the latest; stray OUTs are dropped.
pub fn matched_hours(punches: &[Punch]) -> f64 {
    let mut total_ms: i64 = 0;
    let mut open_in: Option<NaiveDateTime> = None;
    for punch in punches {
        match punch.punch_type {
            PunchType::In => open_in = Some(punch.time),
            PunchType::Out => {
                if let Some(in_time) = open_in.take() {
                    total_ms += (punch.time - in_time).num_milliseconds();
                }
            }
        }
    }
    total_ms as f64 / MS_PER_HOUR
}

/// Derived hours for a day's punch sequence. Stays unset until a second punch
/// exists, matching how the records are written.
pub fn worked_hours(punches: &[Punch], strict: bool) -> Option<f64> {
    if punches.len() < 2 {
        return None;
    }
    Some(if strict {
        matched_hours(punches)
    } else {
        positional_hours(punches)
    })
}

pub fn derive_status(punches: &[Punch]) -> AttendanceStatus {
    if punches.is_empty() {
        AttendanceStatus::Absent
    } else {
        AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn punch(punch_type: PunchType, hour: u32, min: u32) -> Punch {
        Punch {
            punch_type,
            time: at(hour, min),
            device: None,
            ip: None,
            gps: None,
        }
    }

    #[test]
    fn punch_types_strictly_alternate() {
        let mut punches = Vec::new();
        for i in 0..6 {
            let next = next_punch_type(&punches);
            if i % 2 == 0 {
                assert_eq!(next, PunchType::In);
            } else {
                assert_eq!(next, PunchType::Out);
            }
            punches.push(punch(next, 9 + i, 0));
        }
    }

    #[test]
    fn single_pair_full_day() {
        let punches = vec![punch(PunchType::In, 9, 0), punch(PunchType::Out, 17, 0)];
        assert_eq!(worked_hours(&punches, false), Some(8.0));
    }

    #[test]
    fn two_pairs_with_lunch_break() {
        let punches = vec![
            punch(PunchType::In, 9, 0),
            punch(PunchType::Out, 13, 0),
            punch(PunchType::In, 14, 0),
            punch(PunchType::Out, 18, 0),
        ];
        assert_eq!(worked_hours(&punches, false), Some(8.0));
    }

    #[test]
    fn single_punch_leaves_hours_unset() {
        let punches = vec![punch(PunchType::In, 9, 0)];
        assert_eq!(worked_hours(&punches, false), None);
        assert_eq!(worked_hours(&punches, true), None);
    }

    #[test]
    fn odd_trailing_punch_is_ignored() {
        let punches = vec![
            punch(PunchType::In, 9, 0),
            punch(PunchType::Out, 12, 0),
            punch(PunchType::In, 13, 0),
        ];
        assert_eq!(worked_hours(&punches, false), Some(3.0));
    }

    // A duplicated IN (client retry) shifts the positional pairing off by one
    // and drops the whole day; the strict variant still recovers the closed
    // interval.
    #[test]
    fn double_in_positional_vs_matched() {
        let punches = vec![
            punch(PunchType::In, 9, 0),
            punch(PunchType::In, 9, 1),
            punch(PunchType::Out, 17, 0),
        ];
        assert_eq!(positional_hours(&punches), 0.0);
        assert!((matched_hours(&punches) - 7.983_333).abs() < 0.001);
    }

    #[test]
    fn stray_out_contributes_nothing() {
        let punches = vec![punch(PunchType::Out, 9, 0), punch(PunchType::In, 10, 0)];
        assert_eq!(positional_hours(&punches), 0.0);
        assert_eq!(matched_hours(&punches), 0.0);
    }

    #[test]
    fn status_follows_punch_presence() {
        assert_eq!(derive_status(&[]), AttendanceStatus::Absent);
        assert_eq!(
            derive_status(&[punch(PunchType::In, 9, 0)]),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn status_strings_round_trip() {
        assert_eq!(AttendanceStatus::Wfh.to_string(), "WFH");
        assert_eq!("OnDuty".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::OnDuty);
        assert_eq!("IN".parse::<PunchType>().unwrap(), PunchType::In);
    }
}
