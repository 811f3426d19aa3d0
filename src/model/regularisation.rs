use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Punch, PunchType};

/// Approval fabricates a fixed 09:00 shift of this many hours.
pub const REGULARISED_SHIFT_HOURS: i64 = 9;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum RegularisationType {
    #[serde(rename = "Forgot Punch")]
    #[strum(serialize = "Forgot Punch")]
    ForgotPunch,
    #[serde(rename = "Work From Home")]
    #[strum(serialize = "Work From Home")]
    WorkFromHome,
    #[serde(rename = "On Duty")]
    #[strum(serialize = "On Duty")]
    OnDuty,
    Other,
}

impl RegularisationType {
    /// Status stamped on the attendance record when a request of this type is
    /// approved. `Other` is a pass-through and changes nothing.
    pub fn approved_status(self) -> Option<AttendanceStatus> {
        match self {
            RegularisationType::ForgotPunch => Some(AttendanceStatus::Present),
            RegularisationType::WorkFromHome => Some(AttendanceStatus::Wfh),
            RegularisationType::OnDuty => Some(AttendanceStatus::OnDuty),
            RegularisationType::Other => None,
        }
    }

    pub fn overwrites_punches(self) -> bool {
        !matches!(self, RegularisationType::Other)
    }
}

/// Point-in-time copy of an attendance record, stored on the request both
/// before (at submission) and after (at approval) the overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSnapshot {
    pub punches: Vec<Punch>,
    pub total_hours: Option<f64>,
    pub status: Option<String>,
}

impl AttendanceSnapshot {
    pub fn of(record: &AttendanceRecord) -> Self {
        AttendanceSnapshot {
            punches: record.punches.0.clone(),
            total_hours: record.total_hours,
            status: Some(record.status.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Regularisation {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub reg_type: String,
    pub reason: String,
    pub attachment: Option<String>,
    pub status: String,
    pub approver_id: Option<u64>,
    pub approver_remarks: Option<String>,
    pub applied_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
    pub original_attendance: Option<Json<AttendanceSnapshot>>,
    pub new_attendance: Option<Json<AttendanceSnapshot>>,
}

/// The fabricated shift written over an approved day: IN at 09:00 local,
/// OUT nine hours later.
pub fn synthetic_shift(date: NaiveDate) -> (Vec<Punch>, f64) {
    let start = date.and_hms_opt(9, 0, 0).expect("09:00 is a valid time");
    let end = start + Duration::hours(REGULARISED_SHIFT_HOURS);
    let punches = vec![
        Punch {
            punch_type: PunchType::In,
            time: start,
            device: None,
            ip: None,
            gps: None,
        },
        Punch {
            punch_type: PunchType::Out,
            time: end,
            device: None,
            ip: None,
            gps: None,
        },
    ];
    (punches, REGULARISED_SHIFT_HOURS as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn synthetic_shift_is_nine_to_six() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (punches, hours) = synthetic_shift(date);
        assert_eq!(hours, 9.0);
        assert_eq!(punches.len(), 2);
        assert_eq!(punches[0].punch_type, PunchType::In);
        assert_eq!(punches[0].time.hour(), 9);
        assert_eq!(punches[1].punch_type, PunchType::Out);
        assert_eq!(punches[1].time.hour(), 18);
        assert_eq!(punches[1].time.date(), date);
    }

    #[test]
    fn approved_status_per_type() {
        assert_eq!(
            RegularisationType::ForgotPunch.approved_status(),
            Some(AttendanceStatus::Present)
        );
        assert_eq!(
            RegularisationType::WorkFromHome.approved_status(),
            Some(AttendanceStatus::Wfh)
        );
        assert_eq!(
            RegularisationType::OnDuty.approved_status(),
            Some(AttendanceStatus::OnDuty)
        );
        assert_eq!(RegularisationType::Other.approved_status(), None);
    }

    #[test]
    fn other_is_a_pass_through() {
        assert!(!RegularisationType::Other.overwrites_punches());
        assert!(RegularisationType::ForgotPunch.overwrites_punches());
    }

    #[test]
    fn type_strings_round_trip() {
        assert_eq!(
            "Forgot Punch".parse::<RegularisationType>().unwrap(),
            RegularisationType::ForgotPunch
        );
        assert_eq!(RegularisationType::WorkFromHome.to_string(), "Work From Home");
        assert!("Sick".parse::<RegularisationType>().is_err());
    }
}
