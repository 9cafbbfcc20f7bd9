use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Schema scripts in order; entry `n` upgrades `user_version` from `n` to `n + 1`.
const MIGRATIONS: &[(&str, &str)] = &[("schema_v1.sql", include_str!("schemas/schema_v1.sql"))];

const CURRENT_SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Bring the store up to the newest schema in one transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    let pending = match usize::try_from(version) {
        Ok(applied) if applied <= MIGRATIONS.len() => &MIGRATIONS[applied..],
        _ => bail!(
            "sample store schema version {version} is not supported (expected at most {CURRENT_SCHEMA_VERSION})"
        ),
    };
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;
    for (name, script) in pending {
        tx.execute_batch(script)
            .with_context(|| format!("failed to apply {name}"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("read user_version")
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations(&mut conn).expect("migrate");
        assert_eq!(user_version(&conn), CURRENT_SCHEMA_VERSION);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM expressions", [], |row| row.get(0))
            .expect("expressions table exists");
        assert_eq!(count, 0);

        // Second run is a no-op.
        run_migrations(&mut conn).expect("re-run migrations");
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .expect("bump version");
        assert!(run_migrations(&mut conn).is_err());
    }

    #[test]
    fn negative_version_is_rejected() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        conn.pragma_update(None, "user_version", -1)
            .expect("set version");
        assert!(run_migrations(&mut conn).is_err());
    }
}
