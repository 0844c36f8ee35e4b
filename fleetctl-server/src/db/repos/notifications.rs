//! Notification repository
//!
//! Stores every email/SMS produced by the order lifecycle so clients can
//! read them back, and tracks read state.

use chrono::{DateTime, Utc};
use fleetctl_core::models::Channel;
use fleetctl_core::notify::Draft;
use fleetctl_core::{Paginated, Pagination};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::{parse_column, DbError};

const COLUMNS: &str = "id, user_id, order_id, channel, recipient, subject, message, read, created_at";

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    order_id: Option<Uuid>,
    channel: String,
    recipient: String,
    subject: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

/// Stored notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DbError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            order_id: row.order_id,
            channel: parse_column("notifications", &row.channel)?,
            recipient: row.recipient,
            subject: row.subject,
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// List filter
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationFilter {
    pub user_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub unread_only: bool,
}

/// Notification repository
pub struct NotificationRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist drafts atomically, in order.
    pub async fn insert_all(&self, drafts: Vec<Draft>) -> Result<Vec<Notification>, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(drafts.len());
        let sql = format!(
            "INSERT INTO notifications
                 (id, user_id, order_id, channel, recipient, subject, message, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)
             RETURNING {COLUMNS}"
        );

        for draft in drafts {
            let row: NotificationRow = sqlx::query_as(&sql)
                .bind(Uuid::new_v4())
                .bind(draft.user_id)
                .bind(draft.order_id)
                .bind(draft.channel.as_str())
                .bind(&draft.recipient)
                .bind(&draft.subject)
                .bind(&draft.message)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?;
            stored.push(Notification::try_from(row)?);
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// List notifications, newest first.
    pub async fn list(
        &self,
        filter: NotificationFilter,
        page: Pagination,
    ) -> Result<Paginated<Notification>, DbError> {
        const WHERE: &str = "WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR order_id = ?2)
              AND (?3 = 0 OR read = 0)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications {WHERE}"))
            .bind(filter.user_id)
            .bind(filter.order_id)
            .bind(filter.unread_only)
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM notifications {WHERE}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?4 OFFSET ?5"
        );
        let rows: Vec<NotificationRow> = sqlx::query_as(&sql)
            .bind(filter.user_id)
            .bind(filter.order_id)
            .bind(filter.unread_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Mark one notification read or unread.
    pub async fn set_read(&self, id: Uuid, read: bool) -> Result<Notification, DbError> {
        let sql = format!("UPDATE notifications SET read = ?2 WHERE id = ?1 RETURNING {COLUMNS}");
        let row: NotificationRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(read)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("notification", id))?;

        Notification::try_from(row)
    }

    /// Mark every unread notification of a user read. Returns the count.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DbError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::testing;
    use fleetctl_core::models::UserRole;

    fn draft(user_id: Uuid, channel: Channel) -> Draft {
        Draft {
            user_id,
            order_id: None,
            channel,
            recipient: "someone".into(),
            subject: "Order 12345678: Delivered".into(),
            message: "Your order has been delivered.".into(),
        }
    }

    #[tokio::test]
    async fn insert_list_and_mark_read() {
        let pool = testing::pool().await;
        let user = testing::user(&pool, "n@example.com", UserRole::Client).await;
        let repo = NotificationRepo::new(&pool);

        let stored = repo
            .insert_all(vec![draft(user.id, Channel::Email), draft(user.id, Channel::Sms)])
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|n| !n.read));

        repo.set_read(stored[0].id, true).await.unwrap();

        let unread = repo
            .list(
                NotificationFilter {
                    user_id: Some(user.id),
                    unread_only: true,
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(unread.total, 1);
        assert_eq!(unread.items[0].channel, Channel::Sms);

        assert_eq!(repo.mark_all_read(user.id).await.unwrap(), 1);
        assert_eq!(repo.mark_all_read(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_read_missing_is_not_found() {
        let pool = testing::pool().await;
        let err = NotificationRepo::new(&pool)
            .set_read(Uuid::new_v4(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "notification", .. }));
    }
}
