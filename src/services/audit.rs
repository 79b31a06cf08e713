use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::audit_log::{self, Entity as AuditLogEntity, Model as AuditLogModel},
    errors::ServiceError,
};

/// Writes an audit_log row. Callers pass the transaction their mutation runs
/// in so the audit entry commits or rolls back with it.
pub async fn record<C, O, N>(
    conn: &C,
    entity_type: &str,
    entity_id: Uuid,
    action: &str,
    actor_id: Option<Uuid>,
    old_value: Option<&O>,
    new_value: Option<&N>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
    O: Serialize,
    N: Serialize,
{
    let old_value = old_value
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ServiceError::InternalError(format!("audit serialization failed: {}", e)))?;
    let new_value = new_value
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ServiceError::InternalError(format!("audit serialization failed: {}", e)))?;

    let entry = audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id),
        action: Set(action.to_string()),
        actor_id: Set(actor_id),
        old_value: Set(old_value),
        new_value: Set(new_value),
        created_at: Set(Utc::now()),
    };

    entry.insert(conn).await.map_err(ServiceError::DatabaseError)?;
    Ok(())
}

#[derive(Clone)]
pub struct AuditService {
    db: Arc<DatabaseConnection>,
}

impl AuditService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Audit trail for one entity, newest first.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogModel>, ServiceError> {
        let db = &*self.db;
        let entries = AuditLogEntity::find()
            .filter(audit_log::Column::EntityType.eq(entity_type))
            .filter(audit_log::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_log::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(entries)
    }
}
