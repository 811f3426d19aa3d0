use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Shared state machine of leave and regularisation requests:
/// Pending -> Approved | Rejected, exactly once.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Approved and Rejected are final; only Pending requests can be acted on.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
pub enum ReviewAction {
    #[strum(serialize = "approve")]
    Approve,
    #[strum(serialize = "reject")]
    Reject,
}

impl ReviewAction {
    pub fn resulting_status(self) -> RequestStatus {
        match self {
            ReviewAction::Approve => RequestStatus::Approved,
            ReviewAction::Reject => RequestStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_actionable() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn action_maps_to_terminal_status() {
        assert_eq!(
            ReviewAction::Approve.resulting_status(),
            RequestStatus::Approved
        );
        assert_eq!(
            ReviewAction::Reject.resulting_status(),
            RequestStatus::Rejected
        );
        assert!(ReviewAction::Approve.resulting_status().is_terminal());
    }

    #[test]
    fn status_strings_match_stored_values() {
        assert_eq!(RequestStatus::Pending.to_string(), "Pending");
        assert_eq!(
            "Approved".parse::<RequestStatus>().unwrap(),
            RequestStatus::Approved
        );
        assert!("approved".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn action_parses_from_wire_form() {
        assert_eq!("approve".parse::<ReviewAction>().unwrap(), ReviewAction::Approve);
        assert_eq!("reject".parse::<ReviewAction>().unwrap(), ReviewAction::Reject);
    }
}
