use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::notification::{self, Entity as NotificationEntity, Model as NotificationModel},
    entities::user::{self, Entity as UserEntity},
    errors::ServiceError,
};

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persist a notification for one user.
    #[instrument(skip(self, title, message, link))]
    pub async fn notify_user(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<Vec<NotificationModel>, ServiceError> {
        let db = &*self.db;
        let model = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            kind: Set(kind.to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            link: Set(link.map(str::to_string)),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(vec![model])
    }

    /// Persist one notification per active user holding `role`. Admins are
    /// included for director-targeted messages.
    #[instrument(skip(self, title, message, link))]
    pub async fn notify_role(
        &self,
        role: &str,
        kind: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<Vec<NotificationModel>, ServiceError> {
        let db = &*self.db;

        let mut roles = vec![role.to_string()];
        if role == "director" {
            roles.push("admin".to_string());
        }

        let recipients = UserEntity::find()
            .filter(user::Column::Role.is_in(roles))
            .filter(user::Column::IsActive.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut created = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let model = notification::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(recipient.id),
                kind: Set(kind.to_string()),
                title: Set(title.to_string()),
                message: Set(message.to_string()),
                link: Set(link.map(str::to_string)),
                is_read: Set(false),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
            created.push(model);
        }

        Ok(created)
    }

    /// Notifications for one user, newest first. `unread_only` narrows to the
    /// unread set the frontend polls for.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<NotificationModel>, u64), ServiceError> {
        let db = &*self.db;

        let mut query = NotificationEntity::find()
            .filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((items, total))
    }

    /// Mark one notification read. Scoped to the owner; marking someone
    /// else's notification is NotFound, not Forbidden, to avoid disclosing
    /// other users' ids.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<NotificationModel, ServiceError> {
        let db = &*self.db;

        let found = NotificationEntity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        let mut active: notification::ActiveModel = found.into();
        active.is_read = Set(true);
        active.update(db).await.map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let db = &*self.db;

        let result = NotificationEntity::update_many()
            .col_expr(notification::Column::IsRead, sea_orm::prelude::Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(result.rows_affected)
    }
}
