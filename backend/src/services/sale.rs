//! Sale recording: stock deduction, totals and loyalty points in one transaction

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    convert_quantity, line_total, plan_stock_deduction, round2, sale_subtotal, settle_sale,
    validate_price, validate_sale_amount, validate_sale_quantity, PaginatedResponse, Pagination,
    PlannedLine, PlannedProduct, RecipeItem, Sale, SaleLine, SaleLineRequest, SaleWithLines,
    StockDeduction, StockError, SupplyLevel, Unit,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::LoyaltyConfig;
use crate::error::{AppError, AppResult, FieldCheck};

const SALE_COLUMNS: &str =
    "id, title, customer_id, subtotal, points_redeemed, total, cost_total, points_awarded, created_at";
const SALE_LINE_COLUMNS: &str =
    "id, sale_id, position, product_id, product_name, quantity, unit_price, line_total";
const MAX_TITLE_LENGTH: usize = 150;

#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    points_rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecordSaleInput {
    pub title: Option<String>,
    pub customer_id: Option<Uuid>,
    /// Spend the customer's points on this sale
    #[serde(default)]
    pub redeem_points: bool,
    pub lines: Vec<SaleLineRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub customer_id: Option<Uuid>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// What a recorded sale did to stock and to the customer's balance
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    #[serde(flatten)]
    pub sale: SaleWithLines,
    pub stock: Vec<StockDeduction>,
    pub customer_points: Option<i64>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct LockedSupply {
    id: Uuid,
    name: String,
    quantity: Decimal,
    min_quantity: Decimal,
    #[sqlx(try_from = "String")]
    unit: Unit,
    unit_cost: Decimal,
}

#[derive(Debug, FromRow)]
struct LockedCustomer {
    id: Uuid,
    name: String,
    points: i64,
    is_active: bool,
}

fn sale_title(title: Option<&str>, now: NaiveDateTime) -> AppResult<String> {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) if title.chars().count() > MAX_TITLE_LENGTH => Err(AppError::validation(
            "title",
            format!("Title must be at most {} characters", MAX_TITLE_LENGTH),
        )),
        Some(title) => Ok(title.to_string()),
        None => Ok(format!("Sale {}", now.format("%Y-%m-%d %H:%M"))),
    }
}

/// Recipe cost of one unit, with recipe quantities converted into supply units
fn unit_cost(recipe: &[RecipeItem], supplies: &HashMap<Uuid, LockedSupply>) -> Decimal {
    recipe
        .iter()
        .filter_map(|item| {
            let supply = supplies.get(&item.supply_id)?;
            let quantity = convert_quantity(item.quantity, item.unit, supply.unit).unwrap_or(item.quantity);
            Some(quantity * supply.unit_cost)
        })
        .sum()
}

impl SaleService {
    pub fn new(db: PgPool, loyalty: &LoyaltyConfig) -> Self {
        Self {
            db,
            points_rate: loyalty.points_rate,
        }
    }

    /// Record a sale.
    ///
    /// Either every supply is decremented, the sale and its lines are stored
    /// and the customer's points move, or nothing changes.
    pub async fn record(&self, input: RecordSaleInput, now: NaiveDateTime) -> AppResult<SaleReceipt> {
        if input.lines.is_empty() {
            return Err(StockError::EmptySale.into());
        }
        for line in &input.lines {
            validate_sale_quantity(line.quantity).for_field("quantity")?;
            if let Some(price) = line.unit_price {
                validate_price(price).for_field("unit_price")?;
            }
        }
        let title = sale_title(input.title.as_deref(), now)?;

        let mut tx = self.db.begin().await?;

        let product_ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<Uuid, ProductRow> =
            sqlx::query_as::<_, ProductRow>("SELECT id, name, price, is_active FROM products WHERE id = ANY($1)")
                .bind(&product_ids)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect();

        let mut recipes: HashMap<Uuid, Vec<RecipeItem>> = HashMap::new();
        for item in sqlx::query_as::<_, RecipeItem>(
            "SELECT id, product_id, supply_id, quantity, unit FROM recipe_items WHERE product_id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?
        {
            recipes.entry(item.product_id).or_default().push(item);
        }

        // Lock in id order so concurrent sales always acquire rows the same way
        let mut supply_ids: Vec<Uuid> = recipes.values().flatten().map(|i| i.supply_id).collect();
        supply_ids.sort();
        supply_ids.dedup();
        let supplies: HashMap<Uuid, LockedSupply> = sqlx::query_as::<_, LockedSupply>(
            r#"
            SELECT id, name, quantity, min_quantity, unit, unit_cost
            FROM supplies
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&supply_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

        let planned_products: HashMap<Uuid, PlannedProduct> = products
            .values()
            .map(|p| {
                (
                    p.id,
                    PlannedProduct {
                        id: p.id,
                        name: p.name.clone(),
                        is_active: p.is_active,
                        recipe: recipes.get(&p.id).cloned().unwrap_or_default(),
                    },
                )
            })
            .collect();
        let levels: HashMap<Uuid, SupplyLevel> = supplies
            .values()
            .map(|s| {
                (
                    s.id,
                    SupplyLevel {
                        id: s.id,
                        name: s.name.clone(),
                        quantity: s.quantity,
                        min_quantity: s.min_quantity,
                        unit: s.unit,
                    },
                )
            })
            .collect();
        let planned_lines: Vec<PlannedLine> = input
            .lines
            .iter()
            .map(|l| PlannedLine {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect();

        let plan = match plan_stock_deduction(&planned_lines, &planned_products, &levels) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(error = %err, "Sale rejected");
                return Err(err.into());
            }
        };

        let customer = match input.customer_id {
            Some(id) => {
                let customer = sqlx::query_as::<_, LockedCustomer>(
                    "SELECT id, name, points, is_active FROM customers WHERE id = $1 FOR UPDATE",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;
                if !customer.is_active {
                    return Err(AppError::ValidationError(format!(
                        "Customer '{}' is inactive",
                        customer.name
                    )));
                }
                Some(customer)
            }
            None => None,
        };

        // Every line's product was resolved by the plan
        let mut priced = Vec::with_capacity(input.lines.len());
        let mut cost_total = Decimal::ZERO;
        for line in &input.lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            let unit_price = round2(line.unit_price.unwrap_or(product.price));
            let recipe = recipes.get(&product.id).map(Vec::as_slice).unwrap_or_default();
            cost_total += unit_cost(recipe, &supplies) * Decimal::from(line.quantity);
            priced.push((product, line.quantity, unit_price));
        }
        let subtotal = sale_subtotal(priced.iter().map(|(_, qty, price)| (*price, *qty)));
        validate_sale_amount(subtotal).for_field("lines")?;
        let cost_total = round2(cost_total);
        validate_sale_amount(cost_total).for_field("lines")?;
        let settlement = settle_sale(
            subtotal,
            customer.as_ref().map(|c| c.points),
            input.redeem_points,
            self.points_rate,
        );

        for deduction in &plan.deductions {
            deduct_supply(&mut tx, deduction).await?;
        }

        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (title, customer_id, subtotal, points_redeemed, total, cost_total, points_awarded)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(&title)
        .bind(input.customer_id)
        .bind(settlement.subtotal)
        .bind(settlement.points_redeemed)
        .bind(settlement.total)
        .bind(cost_total)
        .bind(settlement.points_awarded)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(priced.len());
        for (position, (product, quantity, unit_price)) in priced.into_iter().enumerate() {
            let line = sqlx::query_as::<_, SaleLine>(&format!(
                r#"
                INSERT INTO sale_lines (sale_id, position, product_id, product_name, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {SALE_LINE_COLUMNS}
                "#
            ))
            .bind(sale.id)
            .bind(position as i32 + 1)
            .bind(product.id)
            .bind(&product.name)
            .bind(quantity)
            .bind(unit_price)
            .bind(line_total(unit_price, quantity))
            .fetch_one(&mut *tx)
            .await?;
            lines.push(line);
        }

        let customer_points = match &customer {
            Some(customer) => {
                let balance = settlement.balance_after(customer.points);
                sqlx::query("UPDATE customers SET points = $2, updated_at = NOW() WHERE id = $1")
                    .bind(customer.id)
                    .bind(balance)
                    .execute(&mut *tx)
                    .await?;
                Some(balance)
            }
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            total = %sale.total,
            lines = lines.len(),
            points_awarded = sale.points_awarded,
            "Sale recorded"
        );
        for low in plan.low_stock_supplies() {
            tracing::warn!(supply_id = %low.supply_id, supply = %low.supply_name, remaining = %low.remaining, "Supply at or below minimum");
        }

        Ok(SaleReceipt {
            sale: SaleWithLines { sale, lines },
            stock: plan.deductions,
            customer_points,
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SaleWithLines> {
        let sale = sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let lines = sqlx::query_as::<_, SaleLine>(&format!(
            "SELECT {SALE_LINE_COLUMNS} FROM sale_lines WHERE sale_id = $1 ORDER BY position"
        ))
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithLines { sale, lines })
    }

    /// Sales newest first, without their lines
    pub async fn list(&self, filter: &SaleFilter, pagination: &Pagination) -> AppResult<PaginatedResponse<Sale>> {
        let where_clause = r#"
            WHERE ($1::UUID IS NULL OR customer_id = $1)
              AND ($2::DATE IS NULL OR created_at::date >= $2)
              AND ($3::DATE IS NULL OR created_at::date <= $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales {where_clause}"))
            .bind(filter.customer_id)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_one(&self.db)
            .await?;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales {where_clause} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(filter.customer_id)
        .bind(filter.start)
        .bind(filter.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(pagination.paginate(sales, total))
    }
}

/// Guarded decrement; the row lock makes the guard a backstop
async fn deduct_supply(tx: &mut Transaction<'_, Postgres>, deduction: &StockDeduction) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE supplies
        SET quantity = quantity - $2, updated_at = NOW()
        WHERE id = $1 AND quantity >= $2
        "#,
    )
    .bind(deduction.supply_id)
    .bind(deduction.required)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InsufficientStock {
            supply: deduction.supply_name.clone(),
            required: deduction.required,
            available: deduction.available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 30, 12)
            .unwrap()
    }

    #[test]
    fn test_sale_title_defaults_to_timestamp() {
        assert_eq!(sale_title(None, now()).unwrap(), "Sale 2024-03-04 09:30");
        assert_eq!(sale_title(Some("   "), now()).unwrap(), "Sale 2024-03-04 09:30");
        assert_eq!(sale_title(Some(" Table 4 "), now()).unwrap(), "Table 4");
    }

    #[test]
    fn test_sale_title_length_limit() {
        let long = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert!(sale_title(Some(&long), now()).is_err());
    }

    #[test]
    fn test_unit_cost_converts_into_supply_units() {
        let supply_id = Uuid::new_v4();
        let supplies = HashMap::from([(
            supply_id,
            LockedSupply {
                id: supply_id,
                name: "Coffee beans".to_string(),
                quantity: Decimal::from(2),
                min_quantity: Decimal::ZERO,
                unit: Unit::Kg,
                unit_cost: Decimal::from(30),
            },
        )]);
        let recipe = vec![RecipeItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            supply_id,
            quantity: Decimal::from(18),
            unit: Unit::G,
        }];

        // 0.018 kg at 30 per kg
        assert_eq!(unit_cost(&recipe, &supplies), Decimal::new(54, 2));
    }
}
