use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Loss-of-pay leave is unbounded and exempt from balance checks.
pub const LOP: &str = "LOP";

/// Types surfaced in the balance overview even when no row exists yet.
pub const DEFAULT_LEAVE_TYPES: [&str; 4] = ["CL", "SL", "EL", "LOP"];

/// Every leave type consumes the credited balance except LOP, which is
/// neither checked at apply time nor settled on approval.
pub fn requires_balance_check(leave_type: &str) -> bool {
    leave_type != LOP
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub is_half_day: bool,
    pub half_day_type: Option<String>,
    pub reason: String,
    pub status: String,
    pub approver_id: Option<u64>,
    pub approver_remarks: Option<String>,
    pub applied_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
    pub attachment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lop_is_exempt_from_balance_checks() {
        assert!(!requires_balance_check(LOP));
        assert!(requires_balance_check("CL"));
        assert!(requires_balance_check("SL"));
        // unknown ad-hoc types are still checked
        assert!(requires_balance_check("Sabbatical"));
    }
}
