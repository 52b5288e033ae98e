//! Sample dataset for development and demos

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{EmployeeRole, Unit};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::employee::hash_password;

/// Kiosk password given to every seeded employee
pub const FIXTURE_PASSWORD: &str = "cafe1234";

struct EmployeeFixture {
    name: &'static str,
    email: &'static str,
    role: EmployeeRole,
    hourly_rate: Decimal,
}

struct SupplyFixture {
    name: &'static str,
    quantity: Decimal,
    min_quantity: Decimal,
    unit: Unit,
    unit_cost: Decimal,
}

struct ProductFixture {
    name: &'static str,
    price: Decimal,
    recipe: &'static [(&'static str, i64, u32, Unit)],
}

struct CustomerFixture {
    name: &'static str,
    email: &'static str,
    points: i64,
}

fn employees() -> Vec<EmployeeFixture> {
    vec![
        EmployeeFixture {
            name: "Ana Torres",
            email: "ana@cafe.local",
            role: EmployeeRole::Manager,
            hourly_rate: Decimal::new(1500, 2),
        },
        EmployeeFixture {
            name: "Luis Paredes",
            email: "luis@cafe.local",
            role: EmployeeRole::Barista,
            hourly_rate: Decimal::new(1050, 2),
        },
        EmployeeFixture {
            name: "Marta Quispe",
            email: "marta@cafe.local",
            role: EmployeeRole::Waiter,
            hourly_rate: Decimal::new(900, 2),
        },
        EmployeeFixture {
            name: "Jorge Salas",
            email: "jorge@cafe.local",
            role: EmployeeRole::Cook,
            hourly_rate: Decimal::new(1100, 2),
        },
    ]
}

fn supplies() -> Vec<SupplyFixture> {
    vec![
        SupplyFixture {
            name: "Coffee beans",
            quantity: Decimal::from(5000),
            min_quantity: Decimal::from(1000),
            unit: Unit::G,
            unit_cost: Decimal::new(3, 2),
        },
        SupplyFixture {
            name: "Milk",
            quantity: Decimal::from(20),
            min_quantity: Decimal::from(4),
            unit: Unit::L,
            unit_cost: Decimal::new(120, 2),
        },
        SupplyFixture {
            name: "Sugar",
            quantity: Decimal::from(3),
            min_quantity: Decimal::new(5, 1),
            unit: Unit::Kg,
            unit_cost: Decimal::new(250, 2),
        },
        SupplyFixture {
            name: "Eggs",
            quantity: Decimal::from(60),
            min_quantity: Decimal::from(12),
            unit: Unit::Unit,
            unit_cost: Decimal::new(25, 2),
        },
        SupplyFixture {
            name: "Flour",
            quantity: Decimal::from(10),
            min_quantity: Decimal::from(2),
            unit: Unit::Kg,
            unit_cost: Decimal::new(180, 2),
        },
    ]
}

// (supply, quantity, scale, unit): quantity is Decimal::new(quantity, scale)
fn products() -> Vec<ProductFixture> {
    vec![
        ProductFixture {
            name: "Espresso",
            price: Decimal::new(350, 2),
            recipe: &[("Coffee beans", 18, 0, Unit::G)],
        },
        ProductFixture {
            name: "Cappuccino",
            price: Decimal::new(550, 2),
            recipe: &[
                ("Coffee beans", 18, 0, Unit::G),
                ("Milk", 150, 0, Unit::Ml),
                ("Sugar", 5, 0, Unit::G),
            ],
        },
        ProductFixture {
            name: "Latte",
            price: Decimal::new(600, 2),
            recipe: &[("Coffee beans", 18, 0, Unit::G), ("Milk", 250, 0, Unit::Ml)],
        },
        ProductFixture {
            name: "Pancakes",
            price: Decimal::new(850, 2),
            recipe: &[
                ("Eggs", 2, 0, Unit::Unit),
                ("Flour", 12, 2, Unit::Kg),
                ("Milk", 2, 1, Unit::L),
                ("Sugar", 20, 0, Unit::G),
            ],
        },
        ProductFixture {
            name: "Bottled water",
            price: Decimal::new(200, 2),
            recipe: &[],
        },
    ]
}

fn customers() -> Vec<CustomerFixture> {
    vec![
        CustomerFixture {
            name: "Rosa Medina",
            email: "rosa@example.com",
            points: 40,
        },
        CustomerFixture {
            name: "Carlos Vega",
            email: "carlos@example.com",
            points: 0,
        },
    ]
}

/// Rows created by one seeding run
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SeedSummary {
    pub employees: u64,
    pub supplies: u64,
    pub products: u64,
    pub recipe_items: u64,
    pub customers: u64,
}

impl SeedSummary {
    pub fn total(&self) -> u64 {
        self.employees + self.supplies + self.products + self.recipe_items + self.customers
    }
}

#[derive(Clone)]
pub struct SeedService {
    db: PgPool,
}

impl SeedService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load the sample dataset in one transaction.
    ///
    /// Rows are matched by name or email, so running it again creates nothing.
    pub async fn seed_fixture(&self) -> AppResult<SeedSummary> {
        let mut summary = SeedSummary::default();
        let password_hash = hash_password(FIXTURE_PASSWORD)?;
        let mut tx = self.db.begin().await?;

        for employee in employees() {
            summary.employees += sqlx::query(
                r#"
                INSERT INTO employees (name, email, role, hourly_rate, password_hash)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (email) DO NOTHING
                "#,
            )
            .bind(employee.name)
            .bind(employee.email)
            .bind(employee.role.as_str())
            .bind(employee.hourly_rate)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for supply in supplies() {
            summary.supplies += sqlx::query(
                r#"
                INSERT INTO supplies (name, quantity, min_quantity, unit, unit_cost)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(supply.name)
            .bind(supply.quantity)
            .bind(supply.min_quantity)
            .bind(supply.unit.as_str())
            .bind(supply.unit_cost)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for product in products() {
            summary.products += sqlx::query(
                "INSERT INTO products (name, price) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(product.name)
            .bind(product.price)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            for &(supply, quantity, scale, unit) in product.recipe {
                summary.recipe_items += sqlx::query(
                    r#"
                    INSERT INTO recipe_items (product_id, supply_id, quantity, unit)
                    SELECT p.id, s.id, $3, $4
                    FROM products p, supplies s
                    WHERE p.name = $1 AND s.name = $2
                    ON CONFLICT (product_id, supply_id) DO NOTHING
                    "#,
                )
                .bind(product.name)
                .bind(supply)
                .bind(Decimal::new(quantity, scale))
                .bind(unit.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
            }
        }

        for customer in customers() {
            summary.customers += sqlx::query(
                r#"
                INSERT INTO customers (name, email, points)
                VALUES ($1, $2, $3)
                ON CONFLICT (email) DO NOTHING
                "#,
            )
            .bind(customer.name)
            .bind(customer.email)
            .bind(customer.points)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        tracing::info!(created = summary.total(), "Fixture loaded");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::validate_recipe_item;

    #[test]
    fn test_fixture_recipes_reference_known_supplies() {
        let supplies = supplies();
        for product in products() {
            for &(name, quantity, scale, unit) in product.recipe {
                let supply = supplies
                    .iter()
                    .find(|s| s.name == name)
                    .unwrap_or_else(|| panic!("{} uses unknown supply {}", product.name, name));
                assert!(validate_recipe_item(Decimal::new(quantity, scale), unit, supply.unit).is_ok());
            }
        }
    }

    #[test]
    fn test_fixture_names_are_unique() {
        let mut names: Vec<&str> = products().iter().map(|p| p.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), products().len());
    }
}
