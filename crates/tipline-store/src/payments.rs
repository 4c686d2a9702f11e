// SPDX-License-Identifier: Apache-2.0

use crate::{time, Store, StoreError};
use rusqlite::params;
use tipline_model::PaymentRecord;

impl Store {
    /// Append-only audit write; must be durable before any entitlement
    /// change for the same payment.
    pub async fn append_payment(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        let conn = self.lock().await;
        conn.execute(
            "INSERT INTO payments \
             (user_id, plan_id, order_id, payment_id, amount, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.user_id.0,
                record.plan_id.0,
                record.order_id,
                record.payment_id,
                record.amount,
                record.status.as_str(),
                time::to_millis(record.created_at)
            ],
        )?;
        Ok(())
    }

    pub async fn count_payments(&self) -> Result<u64, StoreError> {
        let conn = self.lock().await;
        conn.query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))
            .map_err(StoreError::from)
    }

    /// Revenue total over successful payments, for the admin stats report.
    pub async fn total_revenue(&self) -> Result<f64, StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'success'",
            [],
            |row| row.get(0),
        )
        .map_err(StoreError::from)
    }
}
