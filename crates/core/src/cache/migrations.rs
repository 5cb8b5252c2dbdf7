//! Schema for the generation store.
//!
//! `generations` holds one row per named cache. `entries` holds the stored
//! responses keyed by `(generation, key_hash)` and cascades on generation
//! delete, so dropping a generation is a single-row delete. Applied versions
//! are recorded in `_migrations`; a database is only ever moved forward.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered schema steps. Versions are strictly increasing.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_generations.sql")),
    (2, include_str!("../../migrations/002_entries.sql")),
];

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
            tracing::debug!(version, "applying cache schema step");
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("step {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn migrated() -> Connection {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;")).await.unwrap();
        run(&conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_rerun_applies_nothing() {
        let conn = migrated().await;
        run(&conn).await.unwrap();

        let versions: Vec<i64> = conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT version FROM _migrations ORDER BY version")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .unwrap();

        let expected: Vec<i64> = MIGRATIONS.iter().map(|(v, _)| *v).collect();
        assert_eq!(versions, expected);
    }

    #[test]
    fn test_versions_strictly_increasing() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_dropping_generation_cascades_to_entries() {
        let conn = migrated().await;

        let remaining: i64 = conn
            .call(|conn| {
                conn.execute_batch(
                    "INSERT INTO generations (name, created_at) VALUES ('extinct-mammals-v48', 'now');
                     INSERT INTO generations (name, created_at) VALUES ('extinct-mammals-v49', 'now');
                     INSERT INTO entries VALUES ('extinct-mammals-v48', 'a', 'GET', '/', 200, 'OK', '[]', x'00', 'now');
                     INSERT INTO entries VALUES ('extinct-mammals-v49', 'a', 'GET', '/', 200, 'OK', '[]', x'00', 'now');
                     DELETE FROM generations WHERE name = 'extinct-mammals-v48';",
                )?;
                conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            })
            .await
            .unwrap();

        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_entry_needs_existing_generation() {
        let conn = migrated().await;
        let result = conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO entries VALUES ('ghost', 'a', 'GET', '/', 200, 'OK', '[]', x'00', 'now')",
                    [],
                )
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_url_index_present() {
        let conn = migrated().await;
        let has_index: bool = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_entries_url')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert!(has_index);
    }
}
