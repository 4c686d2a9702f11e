// SPDX-License-Identifier: Apache-2.0

use crate::{time, Store, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::params;
use tipline_model::{Notification, NotificationId, UserId};

impl Store {
    /// Bulk insert for fan-out. One transaction for the whole batch; an
    /// empty batch is a no-op.
    pub async fn insert_notifications(
        &self,
        recipients: &[(UserId, String)],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        if recipients.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock().await;
        let tx = conn.transaction().map_err(StoreError::from)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO notifications (user_id, message, seen, created_at) \
                 VALUES (?1, ?2, 0, ?3)",
            )?;
            for (user_id, message) in recipients {
                stmt.execute(params![user_id.0, message, time::to_millis(now)])?;
            }
        }
        tx.commit().map_err(StoreError::from)?;
        Ok(recipients.len())
    }

    pub async fn notifications_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, StoreError> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, message, seen, created_at FROM notifications \
             WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id.0], |row| {
            Ok(Notification {
                id: NotificationId(row.get(0)?),
                user_id: UserId(row.get(1)?),
                message: row.get(2)?,
                seen: row.get(3)?,
                created_at: time::from_millis(row.get(4)?),
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    /// Marks every unseen notification of the user; returns how many rows
    /// changed, so a repeat call reports zero.
    pub async fn mark_all_seen(&self, user_id: UserId) -> Result<usize, StoreError> {
        let conn = self.lock().await;
        conn.execute(
            "UPDATE notifications SET seen = 1 WHERE user_id = ?1 AND seen = 0",
            params![user_id.0],
        )
        .map_err(StoreError::from)
    }
}
