use crate::config::Config;
use crate::store::{OwnedStore, Record};
use anyhow::Result;
use async_trait::async_trait;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[
    ("001_bookmarks.sql", include_str!("migrations/001_bookmarks.sql")),
    ("002_categories.sql", include_str!("migrations/002_categories.sql")),
];

/// libsql-backed record store.
///
/// Each collection is one table keyed by `(user_id, <kind>_id)` with a
/// secondary index on the record id; the row body is the record's flat JSON
/// document.
pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    turso_url: Option<String>,
    turso_auth_token: Option<String>,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if Self::is_replica(&self.turso_url, &self.turso_auth_token) {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    async fn migrate(conn: &Connection) -> Result<()> {
        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(conn, filename, sql).await?;
        }
        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => Builder::new_local(&path).build().await?,
        };

        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;
        Self::migrate(&conn).await?;

        Ok(Database {
            db,
            conn,
            turso_url,
            turso_auth_token,
        })
    }

    /// A throwaway in-memory database with migrations applied.
    pub async fn in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;
        Self::migrate(&conn).await?;

        Ok(Database {
            db,
            conn,
            turso_url: None,
            turso_auth_token: None,
        })
    }

    fn row_to_record<T: Record>(row: &libsql::Row) -> Result<T> {
        let document: String = row.get(0)?;
        serde_json::from_str(&document)
            .map_err(|e| anyhow::anyhow!("malformed {} document: {e}", T::COLLECTION.kind))
    }
}

#[async_trait]
impl<T: Record> OwnedStore<T> for Database {
    async fn put(&self, record: &T) -> Result<()> {
        let collection = T::COLLECTION;
        let document = serde_json::to_string(record)?;
        let query = format!(
            "INSERT OR REPLACE INTO {} (user_id, {}, document) VALUES (?, ?, ?)",
            collection.table, collection.id_column
        );
        self.conn
            .execute(&query, libsql::params![record.owner(), record.id(), document])
            .await?;
        Ok(())
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<T>> {
        let collection = T::COLLECTION;
        let query = format!(
            "SELECT document FROM {} WHERE user_id = ? AND {} = ?",
            collection.table, collection.id_column
        );
        let mut rows = self.conn.query(&query, libsql::params![owner, id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_record(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let collection = T::COLLECTION;
        let query = format!(
            "SELECT document FROM {} WHERE {} = ? LIMIT 1",
            collection.table, collection.id_column
        );
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_record(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<T>> {
        let query = format!(
            "SELECT document FROM {} WHERE user_id = ?",
            T::COLLECTION.table
        );
        let mut rows = self.conn.query(&query, libsql::params![owner]).await?;
        let mut records = Vec::new();

        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_record(&row)?);
        }

        Ok(records)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let collection = T::COLLECTION;
        let query = format!(
            "DELETE FROM {} WHERE user_id = ? AND {} = ?",
            collection.table, collection.id_column
        );
        self.conn.execute(&query, libsql::params![owner, id]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bookmark, Category};
    use chrono::Utc;

    fn bookmark(owner: &str, id: &str, category_id: &str) -> Bookmark {
        Bookmark {
            bookmark_id: id.to_string(),
            user_id: owner.to_string(),
            category_id: category_id.to_string(),
            name: "docs".to_string(),
            url: "https://docs.rs".to_string(),
            notes: None,
            tag: None,
            attachment_url: None,
            create_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_and_owner_scoping() {
        let db = Database::in_memory().await.unwrap();
        OwnedStore::<Bookmark>::put(&db, &bookmark("alice", "b1", "c1")).await.unwrap();

        let own: Option<Bookmark> = db.get("alice", "b1").await.unwrap();
        assert_eq!(own.unwrap().url, "https://docs.rs");

        let foreign: Option<Bookmark> = db.get("bob", "b1").await.unwrap();
        assert!(foreign.is_none());

        let by_id: Option<Bookmark> = db.find_by_id("b1").await.unwrap();
        assert_eq!(by_id.unwrap().user_id, "alice");
    }

    #[tokio::test]
    async fn test_put_replaces_document() {
        let db = Database::in_memory().await.unwrap();
        let mut record = bookmark("alice", "b1", "c1");
        OwnedStore::<Bookmark>::put(&db, &record).await.unwrap();

        record.attachment_url = Some("https://bucket/b1".to_string());
        OwnedStore::<Bookmark>::put(&db, &record).await.unwrap();

        let listed: Vec<Bookmark> = db.list_by_owner("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].attachment_url.as_deref(), Some("https://bucket/b1"));
    }

    #[tokio::test]
    async fn test_collections_are_separate_tables() {
        let db = Database::in_memory().await.unwrap();
        OwnedStore::<Bookmark>::put(&db, &bookmark("alice", "b1", "c1")).await.unwrap();

        let categories: Vec<Category> = db.list_by_owner("alice").await.unwrap();
        assert!(categories.is_empty());

        OwnedStore::<Bookmark>::delete(&db, "alice", "b1").await.unwrap();
        let bookmarks: Vec<Bookmark> = db.list_by_owner("alice").await.unwrap();
        assert!(bookmarks.is_empty());
    }
}
