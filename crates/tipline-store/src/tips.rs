// SPDX-License-Identifier: Apache-2.0

use crate::{parse_col, time, Store, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tipline_model::{PlanType, Tip, TipAction, TipDraft, TipId, UserId};

const TIP_COLS: &str = "id, category, stock_name, action, entry_price, target_price, stop_loss, \
     timeframe, note, is_demo, created_by, created_at, updated_at";

fn tip_from_row(row: &Row<'_>) -> rusqlite::Result<Tip> {
    let category_raw: String = row.get(1)?;
    let action_raw: String = row.get(3)?;
    Ok(Tip {
        id: TipId(row.get(0)?),
        category: parse_col(1, &category_raw, PlanType::parse)?,
        stock_name: row.get(2)?,
        action: parse_col(3, &action_raw, TipAction::parse)?,
        entry_price: row.get(4)?,
        target_price: row.get(5)?,
        stop_loss: row.get(6)?,
        timeframe: row.get(7)?,
        note: row.get(8)?,
        is_demo: row.get(9)?,
        created_by: UserId(row.get(10)?),
        created_at: time::from_millis(row.get(11)?),
        updated_at: time::from_millis(row.get(12)?),
    })
}

impl Store {
    pub async fn create_tip(
        &self,
        draft: &TipDraft,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Tip, StoreError> {
        let conn = self.lock().await;
        conn.execute(
            "INSERT INTO tips (category, stock_name, action, entry_price, target_price, \
             stop_loss, timeframe, note, is_demo, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                draft.category.as_str(),
                draft.stock_name,
                draft.action.as_str(),
                draft.entry_price,
                draft.target_price,
                draft.stop_loss,
                draft.timeframe,
                draft.note,
                draft.is_demo,
                created_by.0,
                time::to_millis(now)
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {TIP_COLS} FROM tips WHERE id = ?1"),
            params![id],
            tip_from_row,
        )
        .map_err(StoreError::from)
    }

    /// Whole-record replace of the mutable fields; `created_by` and
    /// `created_at` survive the edit.
    pub async fn update_tip(
        &self,
        id: TipId,
        draft: &TipDraft,
        now: DateTime<Utc>,
    ) -> Result<Tip, StoreError> {
        let conn = self.lock().await;
        let changed = conn.execute(
            "UPDATE tips SET category = ?2, stock_name = ?3, action = ?4, entry_price = ?5, \
             target_price = ?6, stop_loss = ?7, timeframe = ?8, note = ?9, is_demo = ?10, \
             updated_at = ?11 WHERE id = ?1",
            params![
                id.0,
                draft.category.as_str(),
                draft.stock_name,
                draft.action.as_str(),
                draft.entry_price,
                draft.target_price,
                draft.stop_loss,
                draft.timeframe,
                draft.note,
                draft.is_demo,
                time::to_millis(now)
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("tip {id}")));
        }
        conn.query_row(
            &format!("SELECT {TIP_COLS} FROM tips WHERE id = ?1"),
            params![id.0],
            tip_from_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn delete_tip(&self, id: TipId) -> Result<bool, StoreError> {
        let conn = self.lock().await;
        let changed = conn.execute("DELETE FROM tips WHERE id = ?1", params![id.0])?;
        Ok(changed > 0)
    }

    pub async fn tip_by_id(&self, id: TipId) -> Result<Option<Tip>, StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            &format!("SELECT {TIP_COLS} FROM tips WHERE id = ?1"),
            params![id.0],
            tip_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub async fn list_all_tips(&self) -> Result<Vec<Tip>, StoreError> {
        self.list_tips_where("1 = 1", [] as [&(dyn rusqlite::ToSql + Send + Sync); 0]).await
    }

    pub async fn list_tips_by_category(&self, category: PlanType) -> Result<Vec<Tip>, StoreError> {
        self.list_tips_where("category = ?1", [category.as_str()])
            .await
    }

    pub async fn list_demo_tips(&self) -> Result<Vec<Tip>, StoreError> {
        self.list_tips_where("is_demo = 1", [] as [&(dyn rusqlite::ToSql + Send + Sync); 0]).await
    }

    pub async fn count_tips(&self) -> Result<(u64, u64), StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_demo), 0) FROM tips",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(StoreError::from)
    }

    async fn list_tips_where(
        &self,
        predicate: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Tip>, StoreError> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIP_COLS} FROM tips WHERE {predicate} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params, tip_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}
