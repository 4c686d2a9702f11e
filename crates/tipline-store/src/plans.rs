// SPDX-License-Identifier: Apache-2.0

use crate::{parse_col, time, Store, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tipline_model::{Plan, PlanDraft, PlanId, PlanType};

const PLAN_COLS: &str = "id, name, price, duration, plan_type, description, created_at";

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    let plan_type_raw: String = row.get(4)?;
    Ok(Plan {
        id: PlanId(row.get(0)?),
        name: row.get(1)?,
        price: row.get(2)?,
        duration: row.get(3)?,
        plan_type: parse_col(4, &plan_type_raw, PlanType::parse)?,
        description: row.get(5)?,
        created_at: time::from_millis(row.get(6)?),
    })
}

impl Store {
    pub async fn create_plan(
        &self,
        draft: &PlanDraft,
        now: DateTime<Utc>,
    ) -> Result<Plan, StoreError> {
        let conn = self.lock().await;
        conn.execute(
            "INSERT INTO plans (name, price, duration, plan_type, description, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.name,
                draft.price,
                draft.duration,
                draft.plan_type.as_str(),
                draft.description,
                time::to_millis(now)
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {PLAN_COLS} FROM plans WHERE id = ?1"),
            params![id],
            plan_from_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn plan_by_id(&self, id: PlanId) -> Result<Option<Plan>, StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            &format!("SELECT {PLAN_COLS} FROM plans WHERE id = ?1"),
            params![id.0],
            plan_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>, StoreError> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PLAN_COLS} FROM plans ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], plan_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    /// Hard delete, no cascade: payment records referencing the plan keep
    /// their (now dangling) plan id.
    pub async fn delete_plan(&self, id: PlanId) -> Result<bool, StoreError> {
        let conn = self.lock().await;
        let changed = conn.execute("DELETE FROM plans WHERE id = ?1", params![id.0])?;
        Ok(changed > 0)
    }
}
