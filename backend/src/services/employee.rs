//! Employee management service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    validate_email, validate_name, validate_non_negative, validate_password, validate_phone,
    Employee, EmployeeRole,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldCheck, UniqueViolationExt};

const EMPLOYEE_COLUMNS: &str = "id, name, email, phone, role, hourly_rate, hired_on, is_active, \
                                deactivated_on, password_hash, created_at";

#[derive(Clone)]
pub struct EmployeeService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: EmployeeRole,
    pub hourly_rate: Decimal,
    pub hired_on: Option<NaiveDate>,
    /// Attendance kiosk password, stored hashed
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployeeInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<EmployeeRole>,
    pub hourly_rate: Option<Decimal>,
    pub hired_on: Option<NaiveDate>,
    /// Empty leaves the current password unchanged
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeFilter {
    pub role: Option<EmployeeRole>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Lowercased, trimmed email; blank becomes `None`
pub fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    validate_password(password).for_field("password")?;
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

impl EmployeeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List employees ordered by name
    pub async fn list(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees
            WHERE ($1::TEXT IS NULL OR role = $1)
              AND ($2 OR is_active)
            ORDER BY name
            "#
        ))
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(employees)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))
    }

    /// Active employee by kiosk email, case-insensitive
    pub async fn find_active_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE LOWER(email) = LOWER($1) AND is_active"
        ))
        .bind(email.trim())
        .fetch_optional(&self.db)
        .await?;

        Ok(employee)
    }

    pub async fn create(&self, input: CreateEmployeeInput, today: NaiveDate) -> AppResult<Employee> {
        validate_name(&input.name).for_field("name")?;
        validate_non_negative(input.hourly_rate).for_field("hourly_rate")?;
        let email = normalize_email(input.email.as_deref());
        if let Some(email) = &email {
            validate_email(email).for_field("email")?;
        }
        let phone = normalize_optional(input.phone.as_deref());
        if let Some(phone) = &phone {
            validate_phone(phone).for_field("phone")?;
        }
        let password_hash = match normalize_optional(input.password.as_deref()) {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (name, email, phone, role, hourly_rate, hired_on, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&email)
        .bind(&phone)
        .bind(input.role.as_str())
        .bind(input.hourly_rate)
        .bind(input.hired_on.unwrap_or(today))
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("email".to_string()))?;

        tracing::info!(employee_id = %employee.id, role = %employee.role, "Employee created");
        Ok(employee)
    }

    pub async fn update(&self, id: Uuid, input: UpdateEmployeeInput) -> AppResult<Employee> {
        let current = self.get(id).await?;

        let name = match input.name {
            Some(name) => {
                validate_name(&name).for_field("name")?;
                name.trim().to_string()
            }
            None => current.name,
        };
        let hourly_rate = input.hourly_rate.unwrap_or(current.hourly_rate);
        validate_non_negative(hourly_rate).for_field("hourly_rate")?;
        let email = match input.email {
            Some(email) => normalize_email(Some(&email)),
            None => current.email,
        };
        if let Some(email) = &email {
            validate_email(email).for_field("email")?;
        }
        let phone = match input.phone {
            Some(phone) => normalize_optional(Some(&phone)),
            None => current.phone,
        };
        if let Some(phone) = &phone {
            validate_phone(phone).for_field("phone")?;
        }
        let password_hash = match normalize_optional(input.password.as_deref()) {
            Some(password) => Some(hash_password(&password)?),
            None => current.password_hash,
        };

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET name = $2, email = $3, phone = $4, role = $5, hourly_rate = $6,
                hired_on = $7, password_hash = $8
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(input.role.unwrap_or(current.role).as_str())
        .bind(hourly_rate)
        .bind(input.hired_on.unwrap_or(current.hired_on))
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("email".to_string()))?;

        Ok(employee)
    }

    /// Soft delete: the employee keeps their history but can no longer be scheduled
    pub async fn deactivate(&self, id: Uuid, today: NaiveDate) -> AppResult<Employee> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET is_active = FALSE, deactivated_on = COALESCE(deactivated_on, $2)
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(today)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;

        tracing::info!(employee_id = %employee.id, "Employee deactivated");
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(Some("  Ana@Cafe.COM ")), Some("ana@cafe.com".to_string()));
        assert_eq!(normalize_email(Some("   ")), None);
        assert_eq!(normalize_email(None), None);
    }

    #[test]
    fn test_hash_password_rejects_short_passwords() {
        assert!(matches!(
            hash_password("12"),
            Err(AppError::Validation { ref field, .. }) if field == "password"
        ));
    }
}
