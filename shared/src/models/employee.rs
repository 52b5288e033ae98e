//! Employee models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ParseEnumError;

/// A cafeteria employee. Employees are never hard-deleted so their schedule
/// history stays intact; deactivation clears `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub role: EmployeeRole,
    pub hourly_rate: Decimal,
    pub hired_on: NaiveDate,
    pub is_active: bool,
    pub deactivated_on: Option<NaiveDate>,
    /// bcrypt hash used by the attendance kiosk
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Job role of an employee
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Barista,
    Waiter,
    Manager,
    Cook,
    Other,
}

impl EmployeeRole {
    pub const ALL: [EmployeeRole; 5] = [
        EmployeeRole::Barista,
        EmployeeRole::Waiter,
        EmployeeRole::Manager,
        EmployeeRole::Cook,
        EmployeeRole::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Barista => "barista",
            EmployeeRole::Waiter => "waiter",
            EmployeeRole::Manager => "manager",
            EmployeeRole::Cook => "cook",
            EmployeeRole::Other => "other",
        }
    }
}

impl std::str::FromStr for EmployeeRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmployeeRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("employee role", s))
    }
}

impl TryFrom<String> for EmployeeRole {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
