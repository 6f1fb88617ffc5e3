//! Vault queries.

use chrono::Utc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::StoreError;
use crate::models::VaultRow;

impl Store {
    pub async fn create_vault(&self, name: &str, pin_hash: &str) -> Result<VaultRow, StoreError> {
        let row = VaultRow {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            pin_hash: pin_hash.to_string(),
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO vaults (id, name, pin_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(&row.id)
            .bind(&row.name)
            .bind(&row.pin_hash)
            .bind(row.created_at)
            .execute(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_vault(&self, id: &str) -> Result<Option<VaultRow>, StoreError> {
        let row = sqlx::query_as::<_, VaultRow>("SELECT * FROM vaults WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// All vaults sharing a display name, oldest first — login scans these
    /// in order and the first PIN match wins.
    pub async fn list_vaults_by_name(&self, name: &str) -> Result<Vec<VaultRow>, StoreError> {
        let rows = sqlx::query_as::<_, VaultRow>(
            "SELECT * FROM vaults WHERE name = ? ORDER BY created_at, id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Delete a vault; its credentials go with it (FK cascade).
    pub async fn delete_vault(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM vaults WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("vault {id}")));
        }
        Ok(())
    }
}
