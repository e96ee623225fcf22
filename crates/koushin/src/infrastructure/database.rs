use std::{
    ops::{Deref, DerefMut},
    path::Path,
    str::FromStr,
    time::Duration,
};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

#[derive(Clone)]
pub struct Pool(SqlitePool);

impl From<SqlitePool> for Pool {
    fn from(pool: SqlitePool) -> Self {
        Self(pool)
    }
}

impl Deref for Pool {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Pool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

fn is_memory(database_path: &str) -> bool {
    matches!(database_path, ":memory:" | "sqlite::memory:")
}

/// Opens the catalog and applies pending migrations. `:memory:` gives a
/// private database living as long as the pool.
pub async fn establish_connection(
    database_path: &str,
    create: bool,
) -> Result<Pool, anyhow::Error> {
    let pool = if is_memory(database_path) {
        // every connection would see its own empty database
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?
    } else {
        if create {
            if let Some(parent) = Path::new(database_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .create_if_missing(create)
            .filename(database_path)
            .journal_mode(SqliteJournalMode::Wal);

        SqlitePoolOptions::new()
            .max_connections(5)
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(3 * 60))
            .connect_with(opts)
            .await?
    };

    match sqlx::migrate!("./migrations").run(&pool).await {
        Err(MigrateError::VersionMismatch(version)) => {
            warn!("migration {version} was previously applied but has been modified")
        }
        Err(e) => {
            return Err(e.into());
        }
        _ => {}
    }

    Ok(Pool(pool))
}
