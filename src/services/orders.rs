use chrono::{DateTime, Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    auth::{Actor, Role},
    entities::purchase_order::{self, Entity as PurchaseOrderEntity, Model as PurchaseOrderModel},
    entities::request::{self, Entity as RequestEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit,
    services::budgets,
    services::request_status::{parse_order_status, OrderStatus},
};

#[derive(Debug, Default, serde::Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
}

/// Manages issued purchase orders. Order status changes mirror onto the
/// parent request in the same transaction.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PurchaseOrderModel>, ServiceError> {
        let db = &*self.db;
        PurchaseOrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<PurchaseOrderModel>, u64), ServiceError> {
        let db = &*self.db;

        let mut query = PurchaseOrderEntity::find();
        if let Some(status) = &filter.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        if let Some(request_id) = filter.request_id {
            query = query.filter(purchase_order::Column::RequestId.eq(request_id));
        }

        let paginator = query
            .order_by_desc(purchase_order::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((rows, total))
    }

    /// Advances an order along `emitida` -> `en_transito` -> `recibida`, or
    /// to `cancelada` from any non-terminal state. The parent request is
    /// synced in the same transaction; cancelling releases the consumed
    /// budget.
    #[instrument(skip(self, actor))]
    pub async fn advance_order(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        actor: &Actor,
        actual_delivery: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        actor.require(&[Role::Comprador, Role::Admin], "update purchase orders")?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = PurchaseOrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let current = parse_order_status(&order.status)?;
        if current == new_status {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(order);
        }
        if !current.can_transition_to(new_status) {
            return Err(ServiceError::InvalidTransition(format!(
                "cannot move order from '{}' to '{}'",
                current, new_status
            )));
        }

        if new_status == OrderStatus::Recibida && actual_delivery.is_none() {
            return Err(ServiceError::ValidationError(
                "actual_delivery is required when receiving an order".into(),
            ));
        }

        let req = RequestEntity::find_by_id(order.request_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Request {} not found", order.request_id))
            })?;

        // A cancelled order hands its spend back to the area budget.
        if new_status == OrderStatus::Cancelada {
            budgets::release_within(
                &txn,
                &req.area,
                order.order_date.year(),
                order.total_amount,
            )
            .await?;
        }

        let old_status = order.status.clone();
        let now = Utc::now();

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        if let Some(delivered) = actual_delivery {
            active.actual_delivery = Set(Some(delivered));
        }
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        let updated = active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        // Mirror onto the parent request.
        let requester_id = req.user_id;
        let request_id = req.id;
        let version = req.version;
        let old_request_status = req.status.clone();
        let mut request_active: request::ActiveModel = req.into();
        request_active.status = Set(new_status.as_request_status().to_string());
        request_active.updated_at = Set(Some(now));
        request_active.version = Set(version + 1);
        request_active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        audit::record(
            &txn,
            "purchase_order",
            order_id,
            "advance",
            Some(actor.id),
            Some(&serde_json::json!({ "status": old_status })),
            Some(&serde_json::json!({ "status": updated.status })),
        )
        .await?;
        audit::record(
            &txn,
            "request",
            request_id,
            "order_status_sync",
            Some(actor.id),
            Some(&serde_json::json!({ "status": old_request_status })),
            Some(&serde_json::json!({ "status": new_status.as_request_status().to_string() })),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(folio = %updated.folio, from = %old_status, to = %updated.status, "order advanced");

        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                request_id,
                requester_id,
                old_status,
                new_status: updated.status.clone(),
            })
            .await
        {
            error!(error = %e, "failed to send order status event");
        }

        Ok(updated)
    }

    /// Cancels an order with an optional reason.
    #[instrument(skip(self, actor))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        self.advance_order(order_id, OrderStatus::Cancelada, actor, None, reason)
            .await
    }
}
