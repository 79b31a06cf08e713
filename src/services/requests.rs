use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{Actor, Role},
    entities::purchase_order::{self, Entity as PurchaseOrderEntity},
    entities::request::{self, Entity as RequestEntity, Model as RequestModel},
    entities::request_item::{self, Entity as RequestItemEntity, Model as RequestItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit,
    services::budgets,
    services::quotations,
    services::request_status::{ensure_transition, parse_request_status, OrderStatus, RequestStatus},
};

const PRIORITIES: &[&str] = &["normal", "urgente", "critica"];

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRequestPayload {
    #[validate(length(min = 1, message = "Priority is required"))]
    pub priority: String,
    #[validate(length(min = 1, message = "Justification is required"))]
    pub justification: String,
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_draft: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "A request needs at least one item"))]
    pub items: Vec<CreateRequestItem>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRequestItem {
    #[validate(length(min = 1, message = "Material name is required"))]
    pub material: String,
    pub specification: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    pub approx_unit_cost: Option<Decimal>,
    #[serde(default)]
    pub in_stock: bool,
    pub stock_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub area: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Owns the request status machine: every status write goes through here or
/// through the order mirror in `services::orders`.
#[derive(Clone)]
pub struct RequestLifecycleService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl RequestLifecycleService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a request with its line items. The initial status is derived:
    /// draft flag wins, then a future `scheduled_for`, otherwise the request
    /// enters the approval queue as `pendiente`.
    #[instrument(skip(self, payload, actor), fields(user_id = %actor.id, area = %actor.area))]
    pub async fn create_request(
        &self,
        payload: CreateRequestPayload,
        actor: &Actor,
    ) -> Result<(RequestModel, Vec<RequestItemModel>), ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &payload.items {
            item.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }
        if !PRIORITIES.contains(&payload.priority.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "Invalid priority '{}'. Valid priorities are: {:?}",
                payload.priority, PRIORITIES
            )));
        }

        let now = Utc::now();
        let status = if payload.is_draft {
            RequestStatus::Borrador
        } else if payload.scheduled_for.map_or(false, |at| at > now) {
            RequestStatus::Programada
        } else {
            RequestStatus::Pendiente
        };

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let folio = next_folio(&txn, "REQ", now.year()).await?;
        let request_id = Uuid::new_v4();

        let model = request::ActiveModel {
            id: Set(request_id),
            folio: Set(folio.clone()),
            user_id: Set(actor.id),
            area: Set(actor.area.clone()),
            priority: Set(payload.priority.clone()),
            justification: Set(payload.justification.clone()),
            delivery_date: Set(payload.delivery_date),
            status: Set(status.to_string()),
            authorized_by: Set(None),
            authorized_at: Set(None),
            rejection_reason: Set(None),
            is_draft: Set(payload.is_draft),
            scheduled_for: Set(payload.scheduled_for),
            budget_approved: Set(false),
            notes: Set(payload.notes.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        let mut items = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let item_model = request_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                request_id: Set(request_id),
                material: Set(item.material.clone()),
                specification: Set(item.specification.clone()),
                quantity: Set(item.quantity),
                unit: Set(item.unit.clone()),
                approx_unit_cost: Set(item.approx_unit_cost),
                in_stock: Set(item.in_stock),
                stock_location: Set(item.stock_location.clone()),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
            items.push(item_model);
        }

        audit::record(
            &txn,
            "request",
            request_id,
            "create",
            Some(actor.id),
            None::<&()>,
            Some(&model),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(folio = %folio, status = %status, "request created");

        if status == RequestStatus::Pendiente {
            self.emit(Event::RequestSubmitted {
                request_id,
                folio,
                area: actor.area.clone(),
            })
            .await;
        }

        Ok((model, items))
    }

    #[instrument(skip(self))]
    pub async fn get_request(&self, request_id: Uuid) -> Result<Option<RequestModel>, ServiceError> {
        let db = &*self.db;
        RequestEntity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn get_items(&self, request_id: Uuid) -> Result<Vec<RequestItemModel>, ServiceError> {
        let db = &*self.db;
        RequestItemEntity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn list_requests(
        &self,
        filter: RequestFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<RequestModel>, u64), ServiceError> {
        let db = &*self.db;

        let mut query = RequestEntity::find();
        if let Some(status) = &filter.status {
            query = query.filter(request::Column::Status.eq(status));
        }
        if let Some(area) = &filter.area {
            query = query.filter(request::Column::Area.eq(area));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(request::Column::UserId.eq(user_id));
        }

        let paginator = query
            .order_by_desc(request::Column::CreatedAt)
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

    /// Submits a draft or scheduled request into the approval queue.
    #[instrument(skip(self, actor))]
    pub async fn submit_request(
        &self,
        request_id: Uuid,
        actor: &Actor,
        expected_version: Option<i32>,
    ) -> Result<RequestModel, ServiceError> {
        let updated = self
            .transition(
                request_id,
                RequestStatus::Pendiente,
                actor,
                expected_version,
                "submit",
                |req, actor| {
                    if req.user_id != actor.id && !actor.role.is_admin() {
                        return Err(ServiceError::Forbidden(
                            "only the requester may submit this request".into(),
                        ));
                    }
                    Ok(())
                },
                |active| {
                    active.is_draft = Set(false);
                    active.scheduled_for = Set(None);
                },
            )
            .await?;

        self.emit(Event::RequestSubmitted {
            request_id,
            folio: updated.folio.clone(),
            area: updated.area.clone(),
        })
        .await;

        Ok(updated)
    }

    /// Director approval. Valid only from `pendiente`.
    #[instrument(skip(self, actor))]
    pub async fn authorize(
        &self,
        request_id: Uuid,
        actor: &Actor,
        expected_version: Option<i32>,
    ) -> Result<RequestModel, ServiceError> {
        actor.require(&[Role::Director, Role::Admin], "authorize requests")?;

        let actor_id = actor.id;
        let updated = self
            .transition(
                request_id,
                RequestStatus::Autorizada,
                actor,
                expected_version,
                "authorize",
                |_, _| Ok(()),
                move |active| {
                    active.authorized_by = Set(Some(actor_id));
                    active.authorized_at = Set(Some(Utc::now()));
                },
            )
            .await?;

        self.emit(Event::RequestAuthorized {
            request_id,
            folio: updated.folio.clone(),
            requester_id: updated.user_id,
            authorized_by: actor.id,
        })
        .await;

        Ok(updated)
    }

    /// Director rejection. Valid only from `pendiente`; a reason is required.
    #[instrument(skip(self, actor, reason))]
    pub async fn reject(
        &self,
        request_id: Uuid,
        actor: &Actor,
        reason: &str,
        expected_version: Option<i32>,
    ) -> Result<RequestModel, ServiceError> {
        actor.require(&[Role::Director, Role::Admin], "reject requests")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection reason is required".into(),
            ));
        }

        let reason_owned = reason.to_string();
        let updated = self
            .transition(
                request_id,
                RequestStatus::Rechazada,
                actor,
                expected_version,
                "reject",
                |_, _| Ok(()),
                move |active| {
                    active.rejection_reason = Set(Some(reason_owned));
                },
            )
            .await?;

        self.emit(Event::RequestRejected {
            request_id,
            folio: updated.folio.clone(),
            requester_id: updated.user_id,
            reason: reason.to_string(),
        })
        .await;

        Ok(updated)
    }

    /// Requester-initiated cancellation, allowed before authorization.
    #[instrument(skip(self, actor))]
    pub async fn cancel(
        &self,
        request_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
        expected_version: Option<i32>,
    ) -> Result<RequestModel, ServiceError> {
        let updated = self
            .transition(
                request_id,
                RequestStatus::Cancelada,
                actor,
                expected_version,
                "cancel",
                |req, actor| {
                    let current = parse_request_status(&req.status)?;
                    if !matches!(
                        current,
                        RequestStatus::Pendiente
                            | RequestStatus::Borrador
                            | RequestStatus::Programada
                    ) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "a request in '{}' can no longer be cancelled by the requester",
                            current
                        )));
                    }
                    if req.user_id != actor.id && !actor.role.is_admin() {
                        return Err(ServiceError::Forbidden(
                            "only the requester may cancel this request".into(),
                        ));
                    }
                    Ok(())
                },
                move |active| {
                    if let Some(reason) = reason {
                        active.notes = Set(Some(reason));
                    }
                },
            )
            .await?;

        self.emit(Event::RequestCancelled {
            request_id,
            folio: updated.folio.clone(),
            requester_id: updated.user_id,
        })
        .await;

        Ok(updated)
    }

    /// Explicitly moves an authorized request into quoting. Usually implicit
    /// via the first attached quotation.
    #[instrument(skip(self, actor))]
    pub async fn advance_to_quoting(
        &self,
        request_id: Uuid,
        actor: &Actor,
    ) -> Result<RequestModel, ServiceError> {
        actor.require(&[Role::Comprador, Role::Admin], "advance requests to quoting")?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let req = self.load_for_update(&txn, request_id).await?;
        let current = parse_request_status(&req.status)?;
        if current == RequestStatus::Cotizando {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(req);
        }
        ensure_transition(current, RequestStatus::Cotizando)?;

        let updated = quotations::advance_to_quoting(&txn, req, Some(actor.id)).await?;
        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(updated)
    }

    /// Issues the purchase order for a fully resolved request.
    ///
    /// Every line must carry exactly one selected quotation item or be
    /// flagged in-stock. The order total is the live selected total; budget
    /// is consumed for the request's area in the same transaction, and an
    /// over-budget spend flags rather than blocks.
    #[instrument(skip(self, actor))]
    pub async fn issue_order(
        &self,
        request_id: Uuid,
        actor: &Actor,
        expected_version: Option<i32>,
    ) -> Result<(RequestModel, purchase_order::Model), ServiceError> {
        actor.require(&[Role::Comprador, Role::Admin], "issue purchase orders")?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let req = self.load_for_update(&txn, request_id).await?;
        if let Some(expected) = expected_version {
            if expected != req.version {
                return Err(ServiceError::ConcurrentModification(request_id));
            }
        }

        let current = parse_request_status(&req.status)?;
        ensure_transition(current, RequestStatus::Emitida)?;

        let items = RequestItemEntity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let selected = quotations::selected_items_within(&txn, request_id).await?;

        // Each line needs a winner unless stock covers it.
        let mut unresolved = Vec::new();
        for item in &items {
            let has_selection = selected
                .iter()
                .any(|(quote_item, _)| quote_item.request_item_id == item.id);
            if !has_selection && !item.in_stock {
                unresolved.push(item.material.clone());
            }
        }
        if !unresolved.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "cannot issue order; unresolved items without selection or stock: {}",
                unresolved.join(", ")
            )));
        }
        if selected.is_empty() {
            return Err(ServiceError::ValidationError(
                "cannot issue an order with no selected quotation items".into(),
            ));
        }

        let total_amount: Decimal = selected.iter().map(|(item, _)| item.subtotal).sum();
        let requires_invoice = selected.iter().any(|(item, _)| item.has_invoice);

        // Single-supplier orders keep their supplier and quotation links;
        // multi-supplier orders leave them null and keep provenance on the
        // selected quotation items.
        let mut supplier_ids: Vec<Uuid> =
            selected.iter().map(|(_, q)| q.supplier_id).collect();
        supplier_ids.sort();
        supplier_ids.dedup();
        let (supplier_id, quotation_id) = if supplier_ids.len() == 1 {
            (Some(supplier_ids[0]), Some(selected[0].1.id))
        } else {
            (None, None)
        };

        let expected_delivery = selected
            .iter()
            .filter_map(|(item, _)| item.delivery_date)
            .max();

        let now = Utc::now();
        let order_folio = next_folio(&txn, "OC", now.year()).await?;
        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            folio: Set(order_folio.clone()),
            request_id: Set(request_id),
            supplier_id: Set(supplier_id),
            quotation_id: Set(quotation_id),
            order_date: Set(now),
            expected_delivery: Set(expected_delivery),
            actual_delivery: Set(None),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Emitida.to_string()),
            pdf_path: Set(None),
            requires_invoice: Set(requires_invoice),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        let outcome =
            budgets::consume_within(&txn, &req.area, now.year(), total_amount).await?;

        let old_status = req.status.clone();
        let folio = req.folio.clone();
        let requester_id = req.user_id;
        let area = req.area.clone();
        let version = req.version;

        let mut active: request::ActiveModel = req.into();
        active.status = Set(RequestStatus::Emitida.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        audit::record(
            &txn,
            "request",
            request_id,
            "issue_order",
            Some(actor.id),
            Some(&serde_json::json!({ "status": old_status })),
            Some(&serde_json::json!({ "status": updated.status, "order_folio": order_folio })),
        )
        .await?;
        audit::record(
            &txn,
            "purchase_order",
            order.id,
            "create",
            Some(actor.id),
            None::<&()>,
            Some(&order),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(folio = %folio, order_folio = %order_folio, %total_amount, "purchase order issued");

        self.emit(Event::OrderIssued {
            order_id: order.id,
            folio: order_folio,
            request_id,
            requester_id,
            total_amount,
        })
        .await;

        if outcome.exceeded() {
            warn!(area = %area, overrun = %outcome.overrun, "order exceeds assigned budget");
            self.emit(Event::BudgetExceeded {
                request_id,
                folio,
                area,
                year: now.year(),
                overrun: outcome.overrun,
            })
            .await;
        }

        Ok((updated, order))
    }

    /// Director override acknowledging an over-budget spend.
    #[instrument(skip(self, actor))]
    pub async fn approve_budget(
        &self,
        request_id: Uuid,
        actor: &Actor,
    ) -> Result<RequestModel, ServiceError> {
        actor.require(&[Role::Director, Role::Admin], "approve over-budget spend")?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let req = self.load_for_update(&txn, request_id).await?;
        if req.budget_approved {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(req);
        }

        let version = req.version;
        let mut active: request::ActiveModel = req.into();
        active.budget_approved = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        audit::record(
            &txn,
            "request",
            request_id,
            "approve_budget",
            Some(actor.id),
            Some(&serde_json::json!({ "budget_approved": false })),
            Some(&serde_json::json!({ "budget_approved": true })),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(updated)
    }

    /// The scheduled-submission sweep: moves every due `programada` request
    /// to `pendiente` exactly once. The status filter makes a second run in
    /// the same minute a no-op.
    #[instrument(skip(self))]
    pub async fn activate_due_requests(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let due = RequestEntity::find()
            .filter(request::Column::Status.eq(RequestStatus::Programada.to_string()))
            .filter(request::Column::ScheduledFor.lte(now))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if due.is_empty() {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(0);
        }

        let activated = RequestEntity::update_many()
            .col_expr(
                request::Column::Status,
                sea_orm::prelude::Expr::value(RequestStatus::Pendiente.to_string()),
            )
            .col_expr(
                request::Column::UpdatedAt,
                sea_orm::prelude::Expr::value(Some(now)),
            )
            .filter(request::Column::Status.eq(RequestStatus::Programada.to_string()))
            .filter(request::Column::ScheduledFor.lte(now))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        for req in &due {
            audit::record(
                &txn,
                "request",
                req.id,
                "activate_scheduled",
                None,
                Some(&serde_json::json!({ "status": "programada" })),
                Some(&serde_json::json!({ "status": "pendiente" })),
            )
            .await?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        for req in due {
            self.emit(Event::RequestSubmitted {
                request_id: req.id,
                folio: req.folio,
                area: req.area,
            })
            .await;
        }

        info!(count = activated.rows_affected, "scheduled requests activated");
        Ok(activated.rows_affected)
    }

    async fn load_for_update(
        &self,
        txn: &DatabaseTransaction,
        request_id: Uuid,
    ) -> Result<RequestModel, ServiceError> {
        RequestEntity::find_by_id(request_id)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))
    }

    /// Shared transition plumbing: load, check version, validate the status
    /// move, apply extra column changes, bump version, audit.
    #[allow(clippy::too_many_arguments)]
    async fn transition<G, F>(
        &self,
        request_id: Uuid,
        target: RequestStatus,
        actor: &Actor,
        expected_version: Option<i32>,
        action: &str,
        guard: G,
        apply: F,
    ) -> Result<RequestModel, ServiceError>
    where
        G: FnOnce(&RequestModel, &Actor) -> Result<(), ServiceError>,
        F: FnOnce(&mut request::ActiveModel),
    {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let req = self.load_for_update(&txn, request_id).await?;

        if let Some(expected) = expected_version {
            if expected != req.version {
                return Err(ServiceError::ConcurrentModification(request_id));
            }
        }

        guard(&req, actor)?;

        let current = parse_request_status(&req.status)?;
        if current == target {
            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            return Ok(req);
        }
        ensure_transition(current, target)?;

        let old_status = req.status.clone();
        let version = req.version;

        let mut active: request::ActiveModel = req.into();
        active.status = Set(target.to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        apply(&mut active);

        let updated = active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        audit::record(
            &txn,
            "request",
            request_id,
            action,
            Some(actor.id),
            Some(&serde_json::json!({ "status": old_status })),
            Some(&serde_json::json!({ "status": updated.status })),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(updated)
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!(error = %e, "failed to send workflow event");
        }
    }
}

/// Next folio in the `PREFIX-YEAR-SEQ` sequence, derived from the number of
/// rows already created in the year.
async fn next_folio(
    txn: &DatabaseTransaction,
    prefix: &str,
    year: i32,
) -> Result<String, ServiceError> {
    let pattern = format!("{}-{}-%", prefix, year);
    let count = match prefix {
        "REQ" => RequestEntity::find()
            .filter(request::Column::Folio.like(&pattern))
            .count(txn)
            .await
            .map_err(ServiceError::DatabaseError)?,
        _ => PurchaseOrderEntity::find()
            .filter(purchase_order::Column::Folio.like(&pattern))
            .count(txn)
            .await
            .map_err(ServiceError::DatabaseError)?,
    };

    Ok(format!("{}-{}-{:03}", prefix, year, count + 1))
}
