use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::utils::manager;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Backend Engineer")]
    pub designation: Option<String>,
    #[schema(example = 7)]
    pub manager_id: Option<u64>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub joining_date: Option<NaiveDate>,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub manager_id: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeWithUser {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub employee_code: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub manager_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub joining_date: Option<NaiveDate>,
    pub phone: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeWithUser>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub employee_code: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub manager_id: Option<u64>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub joining_date: Option<NaiveDate>,
    pub phone: Option<String>,
}

const EMPLOYEE_COLUMNS: &str = r#"
    SELECT e.id, e.user_id, u.name, u.email, e.employee_code, e.department,
           e.designation, e.manager_id, e.joining_date, e.phone
    FROM employees e
    JOIN users u ON u.id = e.user_id
"#;

/// Create Employee profile (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/employee",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee profile created"),
        (status = 400, description = "Duplicate code or unknown user"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (user_id, employee_code, department, designation, manager_id, joining_date, phone)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.employee_code.as_deref())
    .bind(payload.department.as_deref())
    .bind(payload.designation.as_deref())
    .bind(payload.manager_id)
    .bind(payload.joining_date)
    .bind(payload.phone.as_deref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Employee profile created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Err(ApiError::validation(
                        "Employee profile already exists or user/manager is unknown",
                    ));
                }
            }
            error!(error = %e, "Failed to create employee profile");
            Err(ApiError::Database)
        }
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

/// Paginated employee directory (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("e.department = ?");
        bindings.push(FilterValue::Str(department.clone()));
    }

    if let Some(manager_id) = query.manager_id {
        conditions.push("e.manager_id = ?");
        bindings.push(FilterValue::U64(manager_id));
    }

    if let Some(search) = &query.search {
        conditions.push("(u.name LIKE ? OR u.email LIKE ? OR e.employee_code LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!(
        "SELECT COUNT(*) FROM employees e JOIN users u ON u.id = e.user_id {}",
        where_clause
    );
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::U64(v) => count_query.bind(*v),
            FilterValue::Str(s) => count_query.bind(s.clone()),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await?;

    // ---------- data query ----------
    let data_sql = format!(
        "{} {} ORDER BY e.id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );

    let mut data_query = sqlx::query_as::<_, EmployeeWithUser>(&data_sql);
    for b in &bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(*v),
            FilterValue::Str(s) => data_query.bind(s.clone()),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeWithUser),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();
    let employee = sqlx::query_as::<_, EmployeeWithUser>(&format!(
        "{} WHERE e.id = ?",
        EMPLOYEE_COLUMNS
    ))
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(ApiError::not_found("Employee not found")),
    }
}

/// Update Employee profile (HR/Admin). Only provided fields change.
#[utoipa::path(
    put,
    path = "/api/v1/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 400, description = "No fields provided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let existing = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, user_id, employee_code, department, designation, manager_id,
               joining_date, phone
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    // SET clause over a fixed column whitelist; the payload never chooses
    // column names.
    let mut sets: Vec<&str> = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();

    if let Some(code) = &payload.employee_code {
        sets.push("employee_code = ?");
        bindings.push(FilterValue::Str(code.clone()));
    }
    if let Some(department) = &payload.department {
        sets.push("department = ?");
        bindings.push(FilterValue::Str(department.clone()));
    }
    if let Some(designation) = &payload.designation {
        sets.push("designation = ?");
        bindings.push(FilterValue::Str(designation.clone()));
    }
    if let Some(manager_id) = payload.manager_id {
        sets.push("manager_id = ?");
        bindings.push(FilterValue::U64(manager_id));
    }
    if let Some(phone) = &payload.phone {
        sets.push("phone = ?");
        bindings.push(FilterValue::Str(phone.clone()));
    }
    if let Some(joining_date) = payload.joining_date {
        sets.push("joining_date = ?");
        dates.push(joining_date);
    }

    if sets.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    let sql = format!("UPDATE employees SET {} WHERE id = ?", sets.join(", "));
    let mut update = sqlx::query(&sql);
    for b in &bindings {
        update = match b {
            FilterValue::U64(v) => update.bind(*v),
            FilterValue::Str(s) => update.bind(s.clone()),
        };
    }
    for d in &dates {
        update = update.bind(*d);
    }
    update.bind(employee_id).execute(pool.get_ref()).await?;

    // Approval routing reads a cache keyed by the report's user id.
    if payload.manager_id.is_some() {
        manager::invalidate(existing.user_id).await;
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated successfully" })))
}

/// Delete Employee profile (Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ManagerOption {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Users holding the Manager role, for assignment dropdowns
#[utoipa::path(
    get,
    path = "/api/v1/employee/managers",
    responses(
        (status = 200, description = "Users holding the Manager role"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_managers(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let managers = sqlx::query_as::<_, ManagerOption>(
        "SELECT id, name, email FROM users WHERE role_id = ? ORDER BY name",
    )
    .bind(Role::Manager.id())
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "managers": managers })))
}
