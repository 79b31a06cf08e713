use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::supplier::{self, Entity as SupplierEntity, Model as SupplierModel},
    errors::ServiceError,
};

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, max = 200, message = "Supplier name is required"))]
    pub name: String,
    #[validate(length(min = 12, max = 13, message = "RFC must be 12 or 13 characters"))]
    pub rfc: String,
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[serde(default)]
    pub can_invoice: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default, utoipa::ToSchema)]
pub struct UpdateSupplierPayload {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub can_invoice: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierFilter {
    pub category: Option<String>,
    pub active: Option<bool>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, payload), fields(rfc = %payload.rfc))]
    pub async fn create_supplier(
        &self,
        payload: CreateSupplierPayload,
    ) -> Result<SupplierModel, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;
        let rfc = payload.rfc.trim().to_uppercase();

        let existing = SupplierEntity::find()
            .filter(supplier::Column::Rfc.eq(&rfc))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "a supplier with RFC {} already exists",
                rfc
            )));
        }

        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(payload.name),
            rfc: Set(rfc),
            contact_name: Set(payload.contact_name),
            contact_email: Set(payload.contact_email),
            contact_phone: Set(payload.contact_phone),
            category: Set(payload.category),
            rating: Set(payload.rating),
            is_active: Set(true),
            can_invoice: Set(payload.can_invoice),
            notes: Set(payload.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        info!(supplier_id = %model.id, "supplier created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Option<SupplierModel>, ServiceError> {
        let db = &*self.db;
        SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        filter: SupplierFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<SupplierModel>, u64), ServiceError> {
        let db = &*self.db;

        let mut query = SupplierEntity::find();
        if let Some(category) = &filter.category {
            query = query.filter(supplier::Column::Category.eq(category));
        }
        if let Some(active) = filter.active {
            query = query.filter(supplier::Column::IsActive.eq(active));
        }

        let paginator = query
            .order_by_asc(supplier::Column::Name)
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

    #[instrument(skip(self, payload))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        payload: UpdateSupplierPayload,
    ) -> Result<SupplierModel, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;
        let existing = SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
            })?;

        let mut active: supplier::ActiveModel = existing.into();
        if let Some(name) = payload.name {
            active.name = Set(name);
        }
        if let Some(contact_name) = payload.contact_name {
            active.contact_name = Set(Some(contact_name));
        }
        if let Some(contact_email) = payload.contact_email {
            active.contact_email = Set(Some(contact_email));
        }
        if let Some(contact_phone) = payload.contact_phone {
            active.contact_phone = Set(Some(contact_phone));
        }
        if let Some(category) = payload.category {
            active.category = Set(Some(category));
        }
        if let Some(rating) = payload.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(can_invoice) = payload.can_invoice {
            active.can_invoice = Set(can_invoice);
        }
        if let Some(notes) = payload.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(Utc::now()));

        active.update(db).await.map_err(ServiceError::DatabaseError)
    }

    /// Soft deactivation. Existing quotations from the supplier remain valid
    /// and selectable.
    #[instrument(skip(self))]
    pub async fn deactivate_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<SupplierModel, ServiceError> {
        let db = &*self.db;
        let existing = SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
            })?;

        let mut active: supplier::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(db).await.map_err(ServiceError::DatabaseError)
    }
}
