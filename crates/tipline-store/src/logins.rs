// SPDX-License-Identifier: Apache-2.0

use crate::{time, Store, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;
use tipline_model::{LoginHistoryEntry, UserId};

/// Login entry joined with the user columns the admin report shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRecord {
    pub login_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub email: String,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Store {
    pub async fn record_login(&self, entry: &LoginHistoryEntry) -> Result<(), StoreError> {
        let conn = self.lock().await;
        conn.execute(
            "INSERT INTO login_history (user_id, login_at, ip_address, user_agent, success) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.user_id.0,
                time::to_millis(entry.login_at),
                entry.ip_address,
                entry.user_agent,
                entry.success
            ],
        )?;
        Ok(())
    }

    pub async fn count_logins(&self) -> Result<u64, StoreError> {
        let conn = self.lock().await;
        conn.query_row("SELECT COUNT(*) FROM login_history", [], |row| row.get(0))
            .map_err(StoreError::from)
    }

    /// Newest-first login report, capped by `limit`.
    pub async fn login_history(&self, limit: usize) -> Result<Vec<LoginRecord>, StoreError> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT l.login_at, l.ip_address, l.user_agent, l.success, \
                    u.email, u.name, u.location \
             FROM login_history l JOIN users u ON u.id = l.user_id \
             ORDER BY l.login_at DESC, l.id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(LoginRecord {
                login_at: time::from_millis(row.get(0)?),
                ip_address: row.get(1)?,
                user_agent: row.get(2)?,
                success: row.get(3)?,
                email: row.get(4)?,
                name: row.get(5)?,
                location: row.get(6)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}
