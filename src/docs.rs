use crate::api::attendance::HistoryQuery;
use crate::api::audit::AuditFilter;
use crate::api::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeWithUser, ManagerOption, UpdateEmployee,
};
use crate::api::leave::{ApplyLeave, LeaveHistoryFilter, ReviewBody};
use crate::api::leave_balance::{AdjustBalance, BalanceQuery};
use crate::api::regularisation::{ApplyRegularisation, RegularisationFilter};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Gps, Punch, PunchType};
use crate::model::audit::AuditLogRow;
use crate::model::employee::Employee;
use crate::model::leave_balance::BalanceFigures;
use crate::model::regularisation::{AttendanceSnapshot, RegularisationType};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staffhub API",
        version = "1.0.0",
        description = r#"
## Staffhub — attendance & leave management

This API powers the attendance punch clock, leave workflow and the
regularisation (attendance correction) workflow of a single organization.

### Key Features
- **Attendance**
  - IN/OUT punch toggling with derived worked hours
  - Personal attendance history
  - Regularisation requests with manager approval and audit snapshots
- **Leave**
  - Balance-checked leave applications (LOP exempt)
  - Manager approval with automatic balance settlement
  - HR credit adjustments
- **Team**
  - Pending requests of direct reports, enriched with day counts
- **Audit**
  - Append-only before/after trail of every mutating decision

### Security
Endpoints are protected using **JWT Bearer authentication**. Leave and
regularisation decisions are restricted to the request owner's reporting
manager; balance adjustments to **HR/Admin**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::punch,
        crate::api::attendance::today,
        crate::api::attendance::history,

        crate::api::regularisation::apply,
        crate::api::regularisation::list_own,
        crate::api::regularisation::approve,
        crate::api::regularisation::reject,

        crate::api::leave::apply,
        crate::api::leave::history,
        crate::api::leave::approve,
        crate::api::leave::reject,

        crate::api::leave_balance::get_balances,
        crate::api::leave_balance::adjust,

        crate::api::team::pending_leaves,
        crate::api::team::pending_regularisations,
        crate::api::team::attendance,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::list_managers,

        crate::api::audit::list_logs
    ),
    components(
        schemas(
            Punch,
            PunchType,
            Gps,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceSnapshot,
            RegularisationType,
            ApplyRegularisation,
            RegularisationFilter,
            HistoryQuery,
            ApplyLeave,
            ReviewBody,
            LeaveHistoryFilter,
            BalanceFigures,
            BalanceQuery,
            AdjustBalance,
            Employee,
            EmployeeWithUser,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse,
            ManagerOption,
            AuditLogRow,
            AuditFilter
        )
    ),
    tags(
        (name = "Attendance", description = "Punch clock and regularisation APIs"),
        (name = "Leave", description = "Leave application, review and balance APIs"),
        (name = "Team", description = "Manager views over direct reports"),
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Audit", description = "Audit trail APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
