use chrono::Utc;
use metrics::counter;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::budget::{self, Entity as BudgetEntity, Model as BudgetModel},
    entities::purchase_order::{self, Entity as PurchaseOrderEntity},
    entities::request::{self, Entity as RequestEntity},
    errors::ServiceError,
    services::request_status::OrderStatus,
};

/// Budget position for an (area, year) pair. `available_amount` may be
/// negative; over-budget state is representable, never clamped.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BudgetStatus {
    pub area: String,
    pub year: i32,
    pub total_amount: Decimal,
    pub spent_amount: Decimal,
    pub available_amount: Decimal,
    /// Display-only. Comparisons always happen on the Decimal fields.
    pub percentage_used: f64,
}

impl BudgetStatus {
    fn from_amounts(area: &str, year: i32, total: Decimal, spent: Decimal) -> Self {
        let percentage_used = if total.is_zero() {
            0.0
        } else {
            (spent / total * Decimal::from(100)).to_f64().unwrap_or(0.0)
        };
        Self {
            area: area.to_string(),
            year,
            total_amount: total,
            spent_amount: spent,
            available_amount: total - spent,
            percentage_used,
        }
    }
}

/// Outcome of consuming budget for an issued order.
#[derive(Debug, Clone)]
pub struct ConsumeOutcome {
    /// Amount by which the area is now over its allowance; zero when within.
    pub overrun: Decimal,
}

impl ConsumeOutcome {
    pub fn exceeded(&self) -> bool {
        self.overrun > Decimal::ZERO
    }
}

/// A correction applied by reconcile().
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DriftCorrection {
    pub area: String,
    pub year: i32,
    pub stored_spent: Decimal,
    pub actual_spent: Decimal,
}

/// Adds `amount` to the accumulator for (area, year) inside the caller's
/// transaction. A missing budget row means no allowance was assigned; the
/// spend proceeds and counts as fully over budget (allow-but-flag policy).
pub async fn consume_within<C: ConnectionTrait>(
    conn: &C,
    area: &str,
    year: i32,
    amount: Decimal,
) -> Result<ConsumeOutcome, ServiceError> {
    let existing = BudgetEntity::find()
        .filter(budget::Column::Area.eq(area))
        .filter(budget::Column::Year.eq(year))
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    match existing {
        Some(row) => {
            let new_spent = row.spent_amount + amount;
            let total = row.total_amount;

            let mut active: budget::ActiveModel = row.into();
            active.spent_amount = Set(new_spent);
            active.updated_at = Set(Some(Utc::now()));
            active.update(conn).await.map_err(ServiceError::DatabaseError)?;

            let overrun = if new_spent > total {
                new_spent - total
            } else {
                Decimal::ZERO
            };
            Ok(ConsumeOutcome { overrun })
        }
        None => {
            warn!(area, year, %amount, "spend recorded against unassigned budget");
            Ok(ConsumeOutcome { overrun: amount })
        }
    }
}

/// Subtracts a previously consumed amount, used when an issued order is
/// cancelled. No-op when no budget row exists.
pub async fn release_within<C: ConnectionTrait>(
    conn: &C,
    area: &str,
    year: i32,
    amount: Decimal,
) -> Result<(), ServiceError> {
    let existing = BudgetEntity::find()
        .filter(budget::Column::Area.eq(area))
        .filter(budget::Column::Year.eq(year))
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if let Some(row) = existing {
        let new_spent = row.spent_amount - amount;
        let mut active: budget::ActiveModel = row.into();
        active.spent_amount = Set(new_spent);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await.map_err(ServiceError::DatabaseError)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct BudgetService {
    db: Arc<DatabaseConnection>,
}

impl BudgetService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Budget position for (area, year). Missing rows degrade to a zeroed
    /// sentinel instead of erroring so the UI can render "no budget assigned".
    #[instrument(skip(self))]
    pub async fn get_budget(&self, area: &str, year: i32) -> Result<BudgetStatus, ServiceError> {
        let db = &*self.db;
        let row = BudgetEntity::find()
            .filter(budget::Column::Area.eq(area))
            .filter(budget::Column::Year.eq(year))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(match row {
            Some(b) => BudgetStatus::from_amounts(area, year, b.total_amount, b.spent_amount),
            None => BudgetStatus::from_amounts(area, year, Decimal::ZERO, Decimal::ZERO),
        })
    }

    /// Assign or update the allowance for (area, year). Spent amount is
    /// preserved on update.
    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        area: &str,
        year: i32,
        total_amount: Decimal,
    ) -> Result<BudgetModel, ServiceError> {
        if total_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "total_amount must not be negative".into(),
            ));
        }

        let db = &*self.db;
        let existing = BudgetEntity::find()
            .filter(budget::Column::Area.eq(area))
            .filter(budget::Column::Year.eq(year))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let model = match existing {
            Some(row) => {
                let mut active: budget::ActiveModel = row.into();
                active.total_amount = Set(total_amount);
                active.updated_at = Set(Some(Utc::now()));
                active.update(db).await.map_err(ServiceError::DatabaseError)?
            }
            None => {
                budget::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    area: Set(area.to_string()),
                    year: Set(year),
                    total_amount: Set(total_amount),
                    spent_amount: Set(Decimal::ZERO),
                    created_at: Set(Utc::now()),
                    updated_at: Set(None),
                }
                .insert(db)
                .await
                .map_err(ServiceError::DatabaseError)?
            }
        };

        info!(area, year, %total_amount, "budget assigned");
        Ok(model)
    }

    /// Recomputes true spend per (area, year) from non-cancelled purchase
    /// orders and corrects drifted accumulators. Corrections are returned and
    /// counted so drift is observable.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<Vec<DriftCorrection>, ServiceError> {
        let db = &*self.db;

        let budgets = BudgetEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut corrections = Vec::new();
        for row in budgets {
            let actual = self.actual_spend(&row.area, row.year).await?;
            if actual != row.spent_amount {
                warn!(
                    area = %row.area,
                    year = row.year,
                    stored = %row.spent_amount,
                    actual = %actual,
                    "budget accumulator drift corrected"
                );
                counter!("procura_budget.drift_corrections", 1);

                corrections.push(DriftCorrection {
                    area: row.area.clone(),
                    year: row.year,
                    stored_spent: row.spent_amount,
                    actual_spent: actual,
                });

                let mut active: budget::ActiveModel = row.into();
                active.spent_amount = Set(actual);
                active.updated_at = Set(Some(Utc::now()));
                active.update(db).await.map_err(ServiceError::DatabaseError)?;
            }
        }

        Ok(corrections)
    }

    /// True spend: total of non-cancelled orders whose parent request belongs
    /// to the area, dated within the year.
    async fn actual_spend(&self, area: &str, year: i32) -> Result<Decimal, ServiceError> {
        let db = &*self.db;

        let orders = PurchaseOrderEntity::find()
            .filter(purchase_order::Column::Status.ne(OrderStatus::Cancelada.to_string()))
            .find_also_related(RequestEntity)
            .filter(request::Column::Area.eq(area))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let total = orders
            .iter()
            .filter(|(order, _)| order.order_date.format("%Y").to_string() == year.to_string())
            .map(|(order, _)| order.total_amount)
            .sum();

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn available_amount_may_go_negative() {
        let status = BudgetStatus::from_amounts("Sistemas", 2025, dec!(10000.00), dec!(10300.00));
        assert_eq!(status.available_amount, dec!(-300.00));
        assert!(status.percentage_used > 100.0);
    }

    #[test]
    fn zero_total_reports_zero_percentage() {
        let status = BudgetStatus::from_amounts("Sistemas", 2025, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(status.available_amount, Decimal::ZERO);
        assert_eq!(status.percentage_used, 0.0);
    }

    #[test]
    fn consume_outcome_flags_overrun() {
        assert!(ConsumeOutcome { overrun: dec!(300.00) }.exceeded());
        assert!(!ConsumeOutcome { overrun: Decimal::ZERO }.exceeded());
    }
}
