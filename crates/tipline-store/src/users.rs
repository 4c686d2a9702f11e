// SPDX-License-Identifier: Apache-2.0

use crate::{parse_col, time, Store, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tipline_model::{Entitlement, PlanType, Role, User, UserId};

pub(crate) const USER_COLS: &str = "id, email, name, image, role, location, age, phone, \
     profile_completed, is_subscribed, plan_type, plan_expiry, push_token, created_at, updated_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_raw: String = row.get(4)?;
    let plan_type = match row.get::<_, Option<String>>(10)? {
        Some(raw) => Some(parse_col(10, &raw, PlanType::parse)?),
        None => None,
    };
    Ok(User {
        id: UserId(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        image: row.get(3)?,
        role: parse_col(4, &role_raw, Role::parse)?,
        location: row.get(5)?,
        age: row.get(6)?,
        phone: row.get(7)?,
        profile_completed: row.get(8)?,
        is_subscribed: row.get(9)?,
        plan_type,
        plan_expiry: row.get::<_, Option<i64>>(11)?.map(time::from_millis),
        push_token: row.get(12)?,
        created_at: time::from_millis(row.get(13)?),
        updated_at: time::from_millis(row.get(14)?),
    })
}

/// Row of the admin active-subscribers report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriberSummary {
    pub user_id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub plan_type: PlanType,
    pub plan_expiry: DateTime<Utc>,
}

impl Store {
    /// First sign-in creates the row with the given role; later sign-ins
    /// only refresh name/image from the identity provider.
    pub async fn upsert_user_on_signin(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let conn = self.lock().await;
        let existing = conn
            .query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?;
        if let Some(user) = existing {
            conn.execute(
                "UPDATE users SET name = COALESCE(?2, name), image = COALESCE(?3, image), \
                 updated_at = ?4 WHERE id = ?1",
                params![user.id.0, name, image, time::to_millis(now)],
            )?;
            return conn
                .query_row(
                    &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                    params![user.id.0],
                    user_from_row,
                )
                .map_err(StoreError::from);
        }
        conn.execute(
            "INSERT INTO users (email, name, image, role, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![email, name, image, role.as_str(), time::to_millis(now)],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id.0],
            user_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Profile completion: stores whatever subset was submitted and flips
    /// `profile_completed`.
    pub async fn update_profile(
        &self,
        id: UserId,
        location: Option<&str>,
        age: Option<u32>,
        phone: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let conn = self.lock().await;
        let changed = conn.execute(
            "UPDATE users SET location = ?2, age = ?3, phone = ?4, profile_completed = 1, \
             updated_at = ?5 WHERE id = ?1",
            params![id.0, location, age, phone, time::to_millis(now)],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id.0],
            user_from_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn set_push_token(
        &self,
        id: UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock().await;
        let changed = conn.execute(
            "UPDATE users SET push_token = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.0, token, time::to_millis(now)],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    /// Entitlement grant. The write is conditional: it only lands when the
    /// new expiry is strictly later than what is stored, so of two racing
    /// successful payments the one buying the longer entitlement wins
    /// regardless of commit order. Returns whether the write applied.
    pub async fn grant_entitlement(
        &self,
        id: UserId,
        plan_type: PlanType,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock().await;
        let expiry_ms = time::to_millis(expiry);
        let changed = conn.execute(
            "UPDATE users SET is_subscribed = 1, plan_type = ?2, plan_expiry = ?3, \
             updated_at = ?4 WHERE id = ?1 AND (plan_expiry IS NULL OR plan_expiry < ?3)",
            params![id.0, plan_type.as_str(), expiry_ms, time::to_millis(now)],
        )?;
        if changed > 0 {
            return Ok(true);
        }
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        if exists {
            Ok(false)
        } else {
            Err(StoreError::NotFound(format!("user {id}")))
        }
    }

    /// The access decision input, computed against the supplied clock.
    pub async fn entitlement(
        &self,
        id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, StoreError> {
        let user = self
            .user_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        Ok(user.entitlement(now))
    }

    /// Fan-out recipient set: active entitlement in the category plus a
    /// registered push identifier.
    pub async fn eligible_recipients(
        &self,
        category: PlanType,
        now: DateTime<Utc>,
    ) -> Result<Vec<User>, StoreError> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users \
             WHERE is_subscribed = 1 AND plan_expiry IS NOT NULL AND plan_expiry > ?1 \
               AND plan_type = ?2 AND push_token IS NOT NULL AND push_token != '' \
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(
            params![time::to_millis(now), category.as_str()],
            user_from_row,
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    pub async fn count_users(&self) -> Result<u64, StoreError> {
        let conn = self.lock().await;
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(StoreError::from)
    }

    pub async fn count_active_subscribers(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let conn = self.lock().await;
        conn.query_row(
            "SELECT COUNT(*) FROM users \
             WHERE is_subscribed = 1 AND plan_expiry IS NOT NULL AND plan_expiry > ?1",
            params![time::to_millis(now)],
            |row| row.get(0),
        )
        .map_err(StoreError::from)
    }

    /// Admin report: active subscribers, furthest expiry first.
    pub async fn active_subscribers(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriberSummary>, StoreError> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, email, name, plan_type, plan_expiry FROM users \
             WHERE is_subscribed = 1 AND plan_expiry IS NOT NULL AND plan_expiry > ?1 \
               AND plan_type IS NOT NULL \
             ORDER BY plan_expiry DESC",
        )?;
        let rows = stmt.query_map(params![time::to_millis(now)], |row| {
            let plan_type_raw: String = row.get(3)?;
            Ok(SubscriberSummary {
                user_id: UserId(row.get(0)?),
                email: row.get(1)?,
                name: row.get(2)?,
                plan_type: parse_col(3, &plan_type_raw, PlanType::parse)?,
                plan_expiry: time::from_millis(row.get(4)?),
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seed_user(store: &Store, email: &str) -> User {
        store
            .upsert_user_on_signin(email, Some("Trader"), None, Role::User, Utc::now())
            .await
            .expect("seed user")
    }

    #[tokio::test]
    async fn signin_creates_once_and_keeps_role() {
        let store = Store::open_in_memory().expect("store");
        let first = seed_user(&store, "a@example.com").await;
        let again = store
            .upsert_user_on_signin("a@example.com", None, None, Role::Admin, Utc::now())
            .await
            .expect("second signin");
        assert_eq!(first.id, again.id);
        // Role is assigned at creation; later sign-ins cannot escalate it.
        assert_eq!(again.role, Role::User);
        assert_eq!(again.name.as_deref(), Some("Trader"));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn grant_is_conditional_on_expiry_moving_forward() {
        let store = Store::open_in_memory().expect("store");
        let user = seed_user(&store, "a@example.com").await;
        let now = Utc::now();
        let later = now + Duration::days(30);
        let sooner = now + Duration::days(3);

        assert!(store
            .grant_entitlement(user.id, PlanType::Equity, later, now)
            .await
            .unwrap());
        // An older in-flight payment must not rewind the entitlement.
        assert!(!store
            .grant_entitlement(user.id, PlanType::Futures, sooner, now)
            .await
            .unwrap());

        let stored = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.plan_type, Some(PlanType::Equity));
        assert_eq!(
            stored.plan_expiry.map(crate::time::to_millis),
            Some(crate::time::to_millis(later))
        );
    }

    #[tokio::test]
    async fn grant_for_unknown_user_is_not_found() {
        let store = Store::open_in_memory().expect("store");
        let err = store
            .grant_entitlement(UserId(99), PlanType::Equity, Utc::now(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn entitlement_boundary_is_strict() {
        let store = Store::open_in_memory().expect("store");
        let user = seed_user(&store, "a@example.com").await;
        let now = Utc::now();
        let expiry = now + Duration::days(1);
        store
            .grant_entitlement(user.id, PlanType::Options, expiry, now)
            .await
            .unwrap();

        assert!(store.entitlement(user.id, now).await.unwrap().active);
        // now == plan_expiry is expired. Compare at millisecond storage
        // granularity, which is what the store persists.
        let at_expiry = crate::time::from_millis(crate::time::to_millis(expiry));
        assert!(!store.entitlement(user.id, at_expiry).await.unwrap().active);
    }

    #[tokio::test]
    async fn recipient_set_filters_expiry_category_and_push_token() {
        let store = Store::open_in_memory().expect("store");
        let now = Utc::now();
        let active = now + Duration::days(5);
        let expired = now - Duration::days(1);

        let hit = seed_user(&store, "hit@example.com").await;
        store
            .grant_entitlement(hit.id, PlanType::Futures, active, now)
            .await
            .unwrap();
        store.set_push_token(hit.id, "tok-hit", now).await.unwrap();

        let lapsed = seed_user(&store, "lapsed@example.com").await;
        store
            .grant_entitlement(lapsed.id, PlanType::Futures, expired, now)
            .await
            .unwrap();
        store
            .set_push_token(lapsed.id, "tok-lapsed", now)
            .await
            .unwrap();

        let wrong_category = seed_user(&store, "equity@example.com").await;
        store
            .grant_entitlement(wrong_category.id, PlanType::Equity, active, now)
            .await
            .unwrap();
        store
            .set_push_token(wrong_category.id, "tok-eq", now)
            .await
            .unwrap();

        let no_push = seed_user(&store, "nopush@example.com").await;
        store
            .grant_entitlement(no_push.id, PlanType::Futures, active, now)
            .await
            .unwrap();

        let recipients = store
            .eligible_recipients(PlanType::Futures, now)
            .await
            .unwrap();
        let ids: Vec<_> = recipients.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![hit.id]);
    }
}
