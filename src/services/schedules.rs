use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::area_schedule::{self, Entity as AreaScheduleEntity, Model as AreaScheduleModel},
    entities::no_requirement::{self, Entity as NoRequirementEntity, Model as NoRequirementModel},
    errors::ServiceError,
};

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSchedulePayload {
    #[validate(length(min = 1, message = "Area is required"))]
    pub area: String,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct DeclareNoRequirementPayload {
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    pub note: Option<String>,
}

/// Submission windows per area, plus "nothing to buy this period"
/// declarations. Plain CRUD consulted by the frontend scheduling views.
#[derive(Clone)]
pub struct ScheduleService {
    db: Arc<DatabaseConnection>,
}

impl ScheduleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, payload))]
    pub async fn create_schedule(
        &self,
        payload: CreateSchedulePayload,
        created_by: Uuid,
    ) -> Result<AreaScheduleModel, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if payload.closes_at <= payload.opens_at {
            return Err(ServiceError::ValidationError(
                "closes_at must be after opens_at".into(),
            ));
        }

        let db = &*self.db;
        area_schedule::ActiveModel {
            id: Set(Uuid::new_v4()),
            area: Set(payload.area),
            opens_at: Set(payload.opens_at),
            closes_at: Set(payload.closes_at),
            created_by: Set(created_by),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn list_schedules(
        &self,
        area: Option<String>,
    ) -> Result<Vec<AreaScheduleModel>, ServiceError> {
        let db = &*self.db;
        let mut query = AreaScheduleEntity::find();
        if let Some(area) = area {
            query = query.filter(area_schedule::Column::Area.eq(area));
        }
        query
            .order_by_desc(area_schedule::Column::OpensAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Records an area's declaration for a period. One declaration per
    /// (area, year, month).
    #[instrument(skip(self, payload))]
    pub async fn declare_no_requirement(
        &self,
        area: &str,
        payload: DeclareNoRequirementPayload,
        declared_by: Uuid,
    ) -> Result<NoRequirementModel, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;
        let existing = NoRequirementEntity::find()
            .filter(no_requirement::Column::Area.eq(area))
            .filter(no_requirement::Column::Year.eq(payload.year))
            .filter(no_requirement::Column::Month.eq(payload.month))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "area {} already declared no requirements for {}-{:02}",
                area, payload.year, payload.month
            )));
        }

        no_requirement::ActiveModel {
            id: Set(Uuid::new_v4()),
            area: Set(area.to_string()),
            year: Set(payload.year),
            month: Set(payload.month),
            declared_by: Set(declared_by),
            note: Set(payload.note),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn list_no_requirements(
        &self,
        area: Option<String>,
        year: Option<i32>,
    ) -> Result<Vec<NoRequirementModel>, ServiceError> {
        let db = &*self.db;
        let mut query = NoRequirementEntity::find();
        if let Some(area) = area {
            query = query.filter(no_requirement::Column::Area.eq(area));
        }
        if let Some(year) = year {
            query = query.filter(no_requirement::Column::Year.eq(year));
        }
        query
            .order_by_desc(no_requirement::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
