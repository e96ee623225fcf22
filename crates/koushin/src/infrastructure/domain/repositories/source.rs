use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    domain::{
        entities::source::Source,
        repositories::source::{SourceRepository, SourceRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct SourceRepositoryImpl {
    pool: Pool,
}

impl SourceRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

fn source_from_row(row: SqliteRow) -> Source {
    Source {
        id: row.get(0),
        url: row.get(1),
        name: row.get(2),
        last_checked: row.get(3),
    }
}

#[async_trait]
impl SourceRepository for SourceRepositoryImpl {
    async fn get_sources(&self) -> Result<Vec<Source>, SourceRepositoryError> {
        let sources = sqlx::query("SELECT id, url, name, last_checked FROM source ORDER BY id")
            .fetch_all(&self.pool as &SqlitePool)
            .await?
            .into_iter()
            .map(source_from_row)
            .collect();

        Ok(sources)
    }

    async fn get_source_by_id(&self, id: i64) -> Result<Source, SourceRepositoryError> {
        let row = sqlx::query("SELECT id, url, name, last_checked FROM source WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool as &SqlitePool)
            .await?
            .ok_or(SourceRepositoryError::NotFound)?;

        Ok(source_from_row(row))
    }

    async fn insert_source(&self, source: &mut Source) -> Result<(), SourceRepositoryError> {
        let res = sqlx::query("INSERT INTO source(url, name, last_checked) VALUES (?, ?, ?)")
            .bind(&source.url)
            .bind(&source.name)
            .bind(source.last_checked)
            .execute(&self.pool as &SqlitePool)
            .await;

        match res {
            Ok(res) => {
                source.id = res.last_insert_rowid();
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(SourceRepositoryError::Duplicate(source.url.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_source(&self, source: &Source) -> Result<(), SourceRepositoryError> {
        let res = sqlx::query("UPDATE source SET name = ?, last_checked = ? WHERE id = ?")
            .bind(&source.name)
            .bind(source.last_checked)
            .bind(source.id)
            .execute(&self.pool as &SqlitePool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(SourceRepositoryError::NotFound);
        }

        Ok(())
    }
}
