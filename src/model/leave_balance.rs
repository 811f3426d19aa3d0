use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One counter row per (user, leave type, calendar year). Created lazily on
/// the first credit adjustment or settlement, never deleted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    pub year: i32,
    pub total_credited: f64,
    pub used: f64,
    pub balance: f64,
    pub last_updated: Option<NaiveDateTime>,
    pub last_updated_by: Option<u64>,
}

/// The three figures every balance mutation reads and writes together.
/// `balance == total_credited - used` holds after every operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BalanceFigures {
    pub total_credited: f64,
    pub used: f64,
    pub balance: f64,
}

impl BalanceFigures {
    /// HR credit adjustment. `delta` may be negative; no floor is enforced.
    pub fn credit(&mut self, delta: f64) {
        self.total_credited += delta;
        self.balance = self.total_credited - self.used;
    }

    /// Settlement on leave approval: consumes `days` of the credited pool.
    /// May drive the balance negative when nothing was credited.
    pub fn settle(&mut self, days: f64) {
        self.used += days;
        self.balance = self.total_credited - self.used;
    }
}

impl From<&LeaveBalance> for BalanceFigures {
    fn from(row: &LeaveBalance) -> Self {
        BalanceFigures {
            total_credited: row.total_credited,
            used: row.used,
            balance: row.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invariant_holds(f: &BalanceFigures) -> bool {
        (f.balance - (f.total_credited - f.used)).abs() < f64::EPSILON
    }

    #[test]
    fn credit_then_settle_sequence() {
        let mut figures = BalanceFigures::default();
        figures.credit(10.0);
        assert_eq!(figures.balance, 10.0);
        figures.settle(2.0);
        assert_eq!(
            figures,
            BalanceFigures {
                total_credited: 10.0,
                used: 2.0,
                balance: 8.0
            }
        );
        figures.settle(3.0);
        assert_eq!(figures.balance, 5.0);
        assert!(invariant_holds(&figures));
    }

    #[test]
    fn negative_adjustment_can_underflow_balance() {
        let mut figures = BalanceFigures {
            total_credited: 2.0,
            used: 1.0,
            balance: 1.0,
        };
        figures.credit(-4.0);
        assert_eq!(figures.total_credited, -2.0);
        assert_eq!(figures.balance, -3.0);
        assert!(invariant_holds(&figures));
    }

    #[test]
    fn settlement_into_empty_row_goes_negative() {
        // A missing row is treated as zeroed before settlement applies.
        let mut figures = BalanceFigures::default();
        figures.settle(1.5);
        assert_eq!(
            figures,
            BalanceFigures {
                total_credited: 0.0,
                used: 1.5,
                balance: -1.5
            }
        );
    }

    #[test]
    fn invariant_survives_mixed_half_day_sequences() {
        let mut figures = BalanceFigures::default();
        for (credit, settle) in [(12.0, 0.5), (-1.0, 2.5), (0.0, 0.5)] {
            figures.credit(credit);
            assert!(invariant_holds(&figures));
            figures.settle(settle);
            assert!(invariant_holds(&figures));
        }
        assert_eq!(figures.used, 3.5);
        assert_eq!(figures.total_credited, 11.0);
        assert_eq!(figures.balance, 7.5);
    }
}
