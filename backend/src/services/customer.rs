//! Loyalty customers

use serde::Deserialize;
use shared::{validate_email, validate_name, validate_phone, Customer};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldCheck, UniqueViolationExt};
use crate::services::employee::normalize_email;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, points, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub points: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Manual balance correction
    pub points: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilter {
    /// Matches name or email
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

fn check_contact(email: Option<&str>, phone: Option<&str>, points: i64) -> AppResult<()> {
    if let Some(email) = email {
        validate_email(email).for_field("email")?;
    }
    if let Some(phone) = phone {
        validate_phone(phone).for_field("phone")?;
    }
    if points < 0 {
        return Err(AppError::validation("points", "Points cannot be negative"));
    }
    Ok(())
}

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &CustomerFilter) -> AppResult<Vec<Customer>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE ($1 OR is_active)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
            ORDER BY name
            "#
        ))
        .bind(filter.include_inactive)
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn create(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        validate_name(&input.name).for_field("name")?;
        let email = normalize_email(input.email.as_deref());
        let phone = input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
        check_contact(email.as_deref(), phone, input.points)?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, email, phone, points)
            VALUES ($1, $2, $3, $4)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&email)
        .bind(phone)
        .bind(input.points)
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("email".to_string()))?;

        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: Uuid, input: UpdateCustomerInput) -> AppResult<Customer> {
        let current = self.get(id).await?;

        let name = match input.name {
            Some(name) => {
                validate_name(&name).for_field("name")?;
                name.trim().to_string()
            }
            None => current.name,
        };
        let email = match input.email {
            Some(email) => normalize_email(Some(&email)),
            None => current.email,
        };
        let phone = match input.phone {
            Some(phone) => Some(phone.trim().to_string()).filter(|p| !p.is_empty()),
            None => current.phone,
        };
        let points = input.points.unwrap_or(current.points);
        check_contact(email.as_deref(), phone.as_deref(), points)?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, points = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(points)
        .fetch_one(&self.db)
        .await
        .on_unique_violation(|| AppError::DuplicateEntry("email".to_string()))?;

        Ok(customer)
    }

    pub async fn deactivate(&self, id: Uuid) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        tracing::info!(customer_id = %customer.id, "Customer deactivated");
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_contact() {
        assert!(check_contact(Some("ana@cafe.com"), Some("+51 999 111 222"), 10).is_ok());
        assert!(check_contact(None, None, 0).is_ok());
        assert!(matches!(
            check_contact(None, None, -1),
            Err(AppError::Validation { ref field, .. }) if field == "points"
        ));
        assert!(check_contact(Some("not-an-email"), None, 0).is_err());
    }
}
