use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::invoice::{self, Entity as InvoiceEntity, Model as InvoiceModel},
    entities::purchase_order::Entity as PurchaseOrderEntity,
    errors::ServiceError,
    services::request_status::{parse_order_status, OrderStatus},
};

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct RegisterInvoicePayload {
    #[validate(length(min = 1, max = 100, message = "Invoice number is required"))]
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
    pub supplier_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub file_path: Option<String>,
}

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
}

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Registers a fiscal document against a received order. An order may
    /// aggregate several suppliers' invoices, so multiple registrations are
    /// allowed; each may name its issuing supplier.
    #[instrument(skip(self, payload), fields(invoice_number = %payload.invoice_number))]
    pub async fn register(
        &self,
        order_id: Uuid,
        payload: RegisterInvoicePayload,
    ) -> Result<InvoiceModel, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if payload.subtotal < Decimal::ZERO || payload.tax < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "invoice amounts must not be negative".into(),
            ));
        }
        // Amounts must reconcile to the cent.
        if (payload.subtotal + payload.tax).round_dp(2) != payload.total.round_dp(2) {
            return Err(ServiceError::ValidationError(
                "subtotal + tax must equal total".into(),
            ));
        }

        let db = &*self.db;
        let order = PurchaseOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let status = parse_order_status(&order.status)?;
        if status != OrderStatus::Recibida {
            return Err(ServiceError::InvalidTransition(format!(
                "invoices can only be registered against received orders, not '{}'",
                status
            )));
        }

        let model = invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(order_id),
            supplier_id: Set(payload.supplier_id.or(order.supplier_id)),
            invoice_number: Set(payload.invoice_number),
            invoice_date: Set(payload.invoice_date),
            subtotal: Set(payload.subtotal.round_dp(2)),
            tax: Set(payload.tax.round_dp(2)),
            total: Set(payload.total.round_dp(2)),
            file_path: Set(payload.file_path),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        info!(invoice_id = %model.id, order_folio = %order.folio, "invoice registered");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<InvoiceModel>, ServiceError> {
        let db = &*self.db;
        InvoiceEntity::find()
            .filter(invoice::Column::PurchaseOrderId.eq(order_id))
            .order_by_asc(invoice::Column::InvoiceDate)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payload_amounts_must_reconcile() {
        let payload = RegisterInvoicePayload {
            invoice_number: "F-001".into(),
            invoice_date: Utc::now(),
            supplier_id: None,
            subtotal: dec!(100.00),
            tax: dec!(16.00),
            total: dec!(120.00),

            file_path: None,
        };
        // Checked in register(); validate() alone only covers field shape.
        assert!((payload.subtotal + payload.tax).round_dp(2) != payload.total.round_dp(2));
    }
}
