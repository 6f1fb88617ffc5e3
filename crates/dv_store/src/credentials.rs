//! Credential queries, including the atomic attempt-state update.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::Store;
use crate::error::StoreError;
use crate::models::CredentialRow;

pub struct NewCredential<'a> {
    pub vault_id: &'a str,
    pub platform: &'a str,
    /// Already sealed by the caller — never plaintext.
    pub secret_enc: &'a str,
    pub image_path: &'a str,
    pub category: &'a str,
}

impl Store {
    pub async fn insert_credential(
        &self,
        new: NewCredential<'_>,
    ) -> Result<CredentialRow, StoreError> {
        let now = Utc::now();
        let row = CredentialRow {
            id: Uuid::new_v4().to_string(),
            vault_id: new.vault_id.to_string(),
            platform: new.platform.to_string(),
            secret_enc: new.secret_enc.to_string(),
            image_path: new.image_path.to_string(),
            category: new.category.to_string(),
            failed_attempts: 0,
            lock_until: None,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO credentials \
             (id, vault_id, platform, secret_enc, image_path, category, \
              failed_attempts, lock_until, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.vault_id)
        .bind(&row.platform)
        .bind(&row.secret_enc)
        .bind(&row.image_path)
        .bind(&row.category)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_credential(&self, id: &str) -> Result<Option<CredentialRow>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>("SELECT * FROM credentials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_credentials(&self, vault_id: &str) -> Result<Vec<CredentialRow>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            "SELECT * FROM credentials WHERE vault_id = ? ORDER BY created_at, id",
        )
        .bind(vault_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Persist the outcome of one verification attempt.
    ///
    /// The WHERE clause re-checks the `failed_attempts` value the caller
    /// based its transition on; returns `false` (and writes nothing) if a
    /// concurrent attempt got there first.  That keeps guard → compare →
    /// mutate → persist exactly-once per attempt.
    pub async fn store_attempt_state(
        &self,
        id: &str,
        failed_attempts: i64,
        lock_until: Option<DateTime<Utc>>,
        expected_attempts: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE credentials SET failed_attempts = ?, lock_until = ?, updated_at = ? \
             WHERE id = ? AND failed_attempts = ?",
        )
        .bind(failed_attempts)
        .bind(lock_until)
        .bind(Utc::now())
        .bind(id)
        .bind(expected_attempts)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Replace secret and/or image after the owner re-proved the current
    /// plaintext.  Always resets the attempt counter and clears the lock —
    /// the one path besides a successful reveal that does.
    pub async fn update_security(
        &self,
        id: &str,
        secret_enc: Option<&str>,
        image_path: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE credentials SET \
               secret_enc = COALESCE(?, secret_enc), \
               image_path = COALESCE(?, image_path), \
               failed_attempts = 0, lock_until = NULL, updated_at = ? \
             WHERE id = ?",
        )
        .bind(secret_enc)
        .bind(image_path)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("credential {id}")));
        }
        Ok(())
    }

    pub async fn delete_credential(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("credential {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn store_with_credential() -> (tempfile::TempDir, Store, CredentialRow) {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("dv.db")).await.unwrap();
        let vault = store.create_vault("alice", "hash").await.unwrap();
        let cred = store
            .insert_credential(NewCredential {
                vault_id: &vault.id,
                platform: "github",
                secret_enc: "sealed-blob",
                image_path: "uploads/cats.png",
                category: "pets",
            })
            .await
            .unwrap();
        (dir, store, cred)
    }

    #[tokio::test]
    async fn insert_and_fetch_roundtrip() {
        let (_dir, store, cred) = store_with_credential().await;
        let fetched = store.get_credential(&cred.id).await.unwrap().unwrap();
        assert_eq!(fetched.image_path, "uploads/cats.png");
        assert_eq!(fetched.failed_attempts, 0);
        assert!(fetched.lock_until.is_none());
    }

    #[tokio::test]
    async fn attempt_state_update_is_guarded() {
        let (_dir, store, cred) = store_with_credential().await;

        // Fresh counter: expected 0 succeeds.
        assert!(store
            .store_attempt_state(&cred.id, 1, None, 0)
            .await
            .unwrap());

        // Stale expectation: a second writer that also observed 0 loses.
        assert!(!store
            .store_attempt_state(&cred.id, 1, None, 0)
            .await
            .unwrap());

        let row = store.get_credential(&cred.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 1);
    }

    #[tokio::test]
    async fn update_security_resets_lock_state() {
        let (_dir, store, cred) = store_with_credential().await;
        let until = Utc::now() + Duration::hours(24);
        assert!(store
            .store_attempt_state(&cred.id, 3, Some(until), 0)
            .await
            .unwrap());

        store
            .update_security(&cred.id, Some("new-blob"), Some("uploads/dogs.png"))
            .await
            .unwrap();

        let row = store.get_credential(&cred.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 0);
        assert!(row.lock_until.is_none());
        assert_eq!(row.secret_enc, "new-blob");
        assert_eq!(row.image_path, "uploads/dogs.png");
    }

    #[tokio::test]
    async fn vault_delete_cascades_to_credentials() {
        let (_dir, store, cred) = store_with_credential().await;
        store.delete_vault(&cred.vault_id).await.unwrap();
        assert!(store.get_credential(&cred.id).await.unwrap().is_none());
    }
}
