use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::quotation::{self, Entity as QuotationEntity, Model as QuotationModel},
    entities::quotation_item::{self, Entity as QuotationItemEntity},
    entities::request::{self, Entity as RequestEntity},
    entities::request_item::{self, Entity as RequestItemEntity},
    entities::supplier::{self, Entity as SupplierEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit,
    services::request_status::{parse_request_status, RequestStatus},
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AttachQuotationRequest {
    pub request_id: Uuid,
    pub supplier_id: Uuid,
    pub payment_terms: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "A quotation needs at least one item"))]
    pub items: Vec<AttachQuotationItem>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AttachQuotationItem {
    pub request_item_id: Uuid,
    pub unit_price: Decimal,
    pub has_invoice: bool,
    pub delivery_date: Option<DateTime<Utc>>,
    pub has_warranty: bool,
    pub warranty_months: Option<i32>,
}

/// One supplier's bid for one request line, as shown in the comparison view.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuoteOption {
    pub quotation_item_id: Uuid,
    pub quotation_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub has_invoice: bool,
    pub delivery_date: Option<DateTime<Utc>>,
    pub is_selected: bool,
}

/// Comparison matrix for one request line item.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ItemComparison {
    pub request_item_id: Uuid,
    pub material: String,
    pub quantity: i32,
    pub unit: String,
    pub in_stock: bool,
    /// All submitted bids, cheapest first.
    pub options: Vec<QuoteOption>,
    pub selected_quotation_item_id: Option<Uuid>,
    /// True when the line has no winning bid and is not covered by stock;
    /// unresolved lines block order issuance.
    pub unresolved: bool,
}

#[derive(Clone)]
pub struct QuotationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl QuotationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Attaches a supplier's quotation to a request.
    ///
    /// Subtotals are recomputed server-side from the request item quantity;
    /// the client's figures are never trusted. A second quotation from the
    /// same supplier for the same request is rejected and the first one is
    /// left untouched. The first quotation on an authorized request advances
    /// it to `cotizando`.
    #[instrument(skip(self, payload), fields(request_id = %payload.request_id, supplier_id = %payload.supplier_id))]
    pub async fn attach_quotation(
        &self,
        payload: AttachQuotationRequest,
        submitted_by: Uuid,
    ) -> Result<QuotationModel, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        for item in &payload.items {
            if item.unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "unit_price must not be negative".into(),
                ));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let req = RequestEntity::find_by_id(payload.request_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Request {} not found", payload.request_id))
            })?;

        let status = parse_request_status(&req.status)?;
        if !matches!(status, RequestStatus::Autorizada | RequestStatus::Cotizando) {
            return Err(ServiceError::InvalidTransition(format!(
                "quotations can only be attached while the request is authorized or quoting, not '{}'",
                status
            )));
        }

        SupplierEntity::find_by_id(payload.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", payload.supplier_id))
            })?;

        let duplicate = QuotationEntity::find()
            .filter(quotation::Column::RequestId.eq(payload.request_id))
            .filter(quotation::Column::SupplierId.eq(payload.supplier_id))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateQuotation(format!(
                "supplier {} already quoted request {}",
                payload.supplier_id, req.folio
            )));
        }

        let request_items = RequestItemEntity::find()
            .filter(request_item::Column::RequestId.eq(payload.request_id))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let quantities: HashMap<Uuid, i32> = request_items
            .iter()
            .map(|item| (item.id, item.quantity))
            .collect();

        let quotation_id = Uuid::new_v4();
        let now = Utc::now();
        let mut total_amount = Decimal::ZERO;
        let mut item_models = Vec::with_capacity(payload.items.len());

        for item in &payload.items {
            let quantity = quantities.get(&item.request_item_id).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "item {} does not belong to request {}",
                    item.request_item_id, req.folio
                ))
            })?;

            let subtotal = (item.unit_price * Decimal::from(*quantity)).round_dp(2);
            total_amount += subtotal;

            item_models.push(quotation_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                quotation_id: Set(quotation_id),
                request_item_id: Set(item.request_item_id),
                unit_price: Set(item.unit_price),
                subtotal: Set(subtotal),
                has_invoice: Set(item.has_invoice),
                delivery_date: Set(item.delivery_date),
                has_warranty: Set(item.has_warranty),
                warranty_months: Set(item.warranty_months),
                is_selected: Set(false),
            });
        }

        let model = quotation::ActiveModel {
            id: Set(quotation_id),
            request_id: Set(payload.request_id),
            supplier_id: Set(payload.supplier_id),
            total_amount: Set(total_amount),
            payment_terms: Set(payload.payment_terms.clone()),
            valid_until: Set(payload.valid_until),
            submitted_by: Set(submitted_by),
            is_selected: Set(false),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        for item_model in item_models {
            item_model
                .insert(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        // First quotation moves the request into quoting.
        if status == RequestStatus::Autorizada {
            advance_to_quoting(&txn, req.clone(), Some(submitted_by)).await?;
        }

        audit::record(
            &txn,
            "quotation",
            quotation_id,
            "attach",
            Some(submitted_by),
            None::<&()>,
            Some(&model),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(quotation_id = %quotation_id, folio = %req.folio, "quotation attached");

        if let Err(e) = self
            .event_sender
            .send(Event::QuotationAttached {
                request_id: payload.request_id,
                quotation_id,
                supplier_id: payload.supplier_id,
            })
            .await
        {
            error!(error = %e, "failed to send quotation attached event");
        }

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<Option<(QuotationModel, Vec<quotation_item::Model>)>, ServiceError> {
        let db = &*self.db;
        let Some(model) = QuotationEntity::find_by_id(quotation_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(None);
        };

        let items = QuotationItemEntity::find()
            .filter(quotation_item::Column::QuotationId.eq(quotation_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(Some((model, items)))
    }

    /// Marks one quotation item as the winning bid for its request line.
    ///
    /// Any previously selected item for the same line is deselected in the
    /// same transaction; selecting an already selected item is a no-op.
    /// Supplier active status is deliberately not re-checked: a submitted
    /// quote is a point-in-time commitment.
    #[instrument(skip(self))]
    pub async fn select_item(
        &self,
        quotation_item_id: Uuid,
        actor_id: Uuid,
    ) -> Result<quotation_item::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let target = QuotationItemEntity::find_by_id(quotation_item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Quotation item {} not found",
                    quotation_item_id
                ))
            })?;

        // One winner per request line: clear competitors first.
        QuotationItemEntity::update_many()
            .col_expr(
                quotation_item::Column::IsSelected,
                sea_orm::prelude::Expr::value(false),
            )
            .filter(quotation_item::Column::RequestItemId.eq(target.request_item_id))
            .filter(quotation_item::Column::Id.ne(quotation_item_id))
            .filter(quotation_item::Column::IsSelected.eq(true))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let request_item_id = target.request_item_id;
        let already_selected = target.is_selected;

        let updated = if already_selected {
            target
        } else {
            let mut active: quotation_item::ActiveModel = target.into();
            active.is_selected = Set(true);
            active.update(&txn).await.map_err(ServiceError::DatabaseError)?
        };

        audit::record(
            &txn,
            "quotation_item",
            quotation_item_id,
            "select",
            Some(actor_id),
            None::<&()>,
            Some(&updated),
        )
        .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::QuotationItemSelected {
                request_item_id,
                quotation_item_id,
            })
            .await
        {
            error!(error = %e, "failed to send item selected event");
        }

        Ok(updated)
    }

    /// Builds the per-line comparison matrix for a request. Pure read.
    #[instrument(skip(self))]
    pub async fn compute_comparison(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<ItemComparison>, ServiceError> {
        let db = &*self.db;

        RequestEntity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))?;

        let items = RequestItemEntity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let quotations = QuotationEntity::find()
            .filter(quotation::Column::RequestId.eq(request_id))
            .find_also_related(SupplierEntity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let supplier_by_quotation: HashMap<Uuid, (Uuid, String)> = quotations
            .iter()
            .map(|(q, s)| {
                let name = s.as_ref().map(|s| s.name.clone()).unwrap_or_default();
                (q.id, (q.supplier_id, name))
            })
            .collect();

        let quotation_ids: Vec<Uuid> = quotations.iter().map(|(q, _)| q.id).collect();
        let quote_items = if quotation_ids.is_empty() {
            Vec::new()
        } else {
            QuotationItemEntity::find()
                .filter(quotation_item::Column::QuotationId.is_in(quotation_ids))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?
        };

        let mut comparison = Vec::with_capacity(items.len());
        for item in items {
            let mut options: Vec<QuoteOption> = quote_items
                .iter()
                .filter(|qi| qi.request_item_id == item.id)
                .map(|qi| {
                    let (supplier_id, supplier_name) = supplier_by_quotation
                        .get(&qi.quotation_id)
                        .cloned()
                        .unwrap_or((Uuid::nil(), String::new()));
                    QuoteOption {
                        quotation_item_id: qi.id,
                        quotation_id: qi.quotation_id,
                        supplier_id,
                        supplier_name,
                        unit_price: qi.unit_price,
                        subtotal: qi.subtotal,
                        has_invoice: qi.has_invoice,
                        delivery_date: qi.delivery_date,
                        is_selected: qi.is_selected,
                    }
                })
                .collect();
            options.sort_by(|a, b| a.unit_price.cmp(&b.unit_price));

            let selected = options
                .iter()
                .find(|o| o.is_selected)
                .map(|o| o.quotation_item_id);
            let unresolved = selected.is_none() && !item.in_stock;

            comparison.push(ItemComparison {
                request_item_id: item.id,
                material: item.material,
                quantity: item.quantity,
                unit: item.unit,
                in_stock: item.in_stock,
                options,
                selected_quotation_item_id: selected,
                unresolved,
            });
        }

        Ok(comparison)
    }

    /// The authoritative order total: the live sum over currently selected
    /// quotation items, independent of any quotation's stated total_amount.
    #[instrument(skip(self))]
    pub async fn total_selected(&self, request_id: Uuid) -> Result<Decimal, ServiceError> {
        let db = &*self.db;
        total_selected_within(db, request_id).await
    }
}

/// Selected quotation items of a request, with their parent quotations.
pub async fn selected_items_within<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> Result<Vec<(quotation_item::Model, QuotationModel)>, ServiceError> {
    let quotations = QuotationEntity::find()
        .filter(quotation::Column::RequestId.eq(request_id))
        .all(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if quotations.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: HashMap<Uuid, QuotationModel> =
        quotations.iter().map(|q| (q.id, q.clone())).collect();

    let items = QuotationItemEntity::find()
        .filter(
            quotation_item::Column::QuotationId.is_in(quotations.iter().map(|q| q.id)),
        )
        .filter(quotation_item::Column::IsSelected.eq(true))
        .order_by_asc(quotation_item::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(items
        .into_iter()
        .filter_map(|item| {
            let parent = by_id.get(&item.quotation_id).cloned()?;
            Some((item, parent))
        })
        .collect())
}

pub async fn total_selected_within<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> Result<Decimal, ServiceError> {
    let selected = selected_items_within(conn, request_id).await?;
    Ok(selected.iter().map(|(item, _)| item.subtotal).sum())
}

/// Moves an authorized request into quoting inside the caller's transaction.
pub async fn advance_to_quoting<C: ConnectionTrait>(
    conn: &C,
    req: request::Model,
    actor_id: Option<Uuid>,
) -> Result<request::Model, ServiceError> {
    let old_status = req.status.clone();
    let request_id = req.id;
    let version = req.version;

    let mut active: request::ActiveModel = req.into();
    active.status = Set(RequestStatus::Cotizando.to_string());
    active.updated_at = Set(Some(Utc::now()));
    active.version = Set(version + 1);
    let updated = active.update(conn).await.map_err(ServiceError::DatabaseError)?;

    audit::record(
        conn,
        "request",
        request_id,
        "advance_to_quoting",
        actor_id,
        Some(&serde_json::json!({ "status": old_status })),
        Some(&serde_json::json!({ "status": updated.status })),
    )
    .await?;

    Ok(updated)
}
