use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    domain::{
        entities::manga::Manga,
        repositories::manga::{MangaRepository, MangaRepositoryError},
    },
    infrastructure::database::Pool,
};

const MANGA_COLUMNS: &str = "id, source_id, slug, title, description, author, status, \
    cover_url, last_chapter, last_uploaded_at, next_release_at, date_added";

#[derive(Clone)]
pub struct MangaRepositoryImpl {
    pool: Pool,
}

impl MangaRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }

    async fn manga_from_row(&self, row: SqliteRow) -> Result<Manga, MangaRepositoryError> {
        let mut manga = Manga {
            id: row.get(0),
            source_id: row.get(1),
            slug: row.get(2),
            title: row.get(3),
            description: row.get(4),
            author: row.get(5),
            status: row.get(6),
            cover_url: row.get(7),
            last_chapter: row.get(8),
            last_uploaded_at: row.get(9),
            next_release_at: row.get(10),
            date_added: row.get(11),
            tags: vec![],
        };

        manga.tags = sqlx::query(
            r#"SELECT tag.name FROM manga_tag
            JOIN tag ON tag.id = manga_tag.tag_id
            WHERE manga_tag.manga_id = ?
            ORDER BY manga_tag.rowid"#,
        )
        .bind(manga.id)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .into_iter()
        .map(|row| row.get::<String, _>(0))
        .collect();

        Ok(manga)
    }
}

#[async_trait]
impl MangaRepository for MangaRepositoryImpl {
    async fn get_manga_by_slug(
        &self,
        source_id: i64,
        slug: &str,
    ) -> Result<Option<Manga>, MangaRepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MANGA_COLUMNS} FROM manga WHERE source_id = ? AND slug = ?"
        ))
        .bind(source_id)
        .bind(slug)
        .fetch_optional(&self.pool as &SqlitePool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.manga_from_row(row).await?)),
            None => Ok(None),
        }
    }

    async fn insert_manga(&self, manga: &mut Manga) -> Result<(), MangaRepositoryError> {
        let res = sqlx::query(
            r#"INSERT INTO manga(
                source_id,
                slug,
                title,
                description,
                author,
                status,
                cover_url,
                last_chapter,
                last_uploaded_at,
                next_release_at,
                date_added
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(manga.source_id)
        .bind(&manga.slug)
        .bind(&manga.title)
        .bind(&manga.description)
        .bind(&manga.author)
        .bind(&manga.status)
        .bind(&manga.cover_url)
        .bind(&manga.last_chapter)
        .bind(manga.last_uploaded_at)
        .bind(manga.next_release_at)
        .bind(manga.date_added)
        .execute(&self.pool as &SqlitePool)
        .await?;

        manga.id = res.last_insert_rowid();

        Ok(())
    }

    async fn update_manga(&self, manga: &Manga) -> Result<(), MangaRepositoryError> {
        let res = sqlx::query(
            r#"UPDATE manga SET
                title = ?,
                description = ?,
                author = ?,
                status = ?,
                cover_url = ?,
                last_chapter = ?,
                last_uploaded_at = ?,
                next_release_at = ?
            WHERE id = ?"#,
        )
        .bind(&manga.title)
        .bind(&manga.description)
        .bind(&manga.author)
        .bind(&manga.status)
        .bind(&manga.cover_url)
        .bind(&manga.last_chapter)
        .bind(manga.last_uploaded_at)
        .bind(manga.next_release_at)
        .bind(manga.id)
        .execute(&self.pool as &SqlitePool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(MangaRepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Timelike, Utc};

    use super::*;
    use crate::{
        domain::{
            entities::source::Source,
            repositories::{source::SourceRepository, tag::TagRepository},
        },
        infrastructure::{
            database::establish_connection,
            domain::repositories::{source::SourceRepositoryImpl, tag::TagRepositoryImpl},
        },
    };

    #[tokio::test]
    async fn test_insert_lookup_update() {
        let pool = establish_connection(":memory:", true).await.unwrap();
        let mut source = Source::new("https://www.mangaread.org", "MangaRead");
        SourceRepositoryImpl::new(pool.clone())
            .insert_source(&mut source)
            .await
            .unwrap();
        let repo = MangaRepositoryImpl::new(pool.clone());

        assert!(repo.get_manga_by_slug(source.id, "berserk").await.unwrap().is_none());

        let now = Utc::now().naive_utc().with_nanosecond(0).unwrap();
        let mut manga = Manga {
            source_id: source.id,
            slug: "berserk".to_string(),
            title: "Berserk".to_string(),
            author: Some("Kentaro Miura".to_string()),
            date_added: now,
            ..Default::default()
        };
        repo.insert_manga(&mut manga).await.unwrap();
        TagRepositoryImpl::new(pool.clone())
            .add_tag_to_manga(manga.id, "Dark Fantasy")
            .await
            .unwrap();

        manga.last_chapter = Some("Chapter 375".to_string());
        manga.next_release_at = Some(now + Duration::days(7));
        repo.update_manga(&manga).await.unwrap();

        let stored = repo.get_manga_by_slug(source.id, "berserk").await.unwrap().unwrap();
        assert_eq!(stored.last_chapter.as_deref(), Some("Chapter 375"));
        assert_eq!(stored.next_release_at, Some(now + Duration::days(7)));
        assert_eq!(stored.tags, vec!["Dark Fantasy".to_string()]);
    }

    #[tokio::test]
    async fn test_slug_unique_per_source() {
        let pool = establish_connection(":memory:", true).await.unwrap();
        let sources = SourceRepositoryImpl::new(pool.clone());
        let mut a = Source::new("https://a.example", "A");
        let mut b = Source::new("https://b.example", "B");
        sources.insert_source(&mut a).await.unwrap();
        sources.insert_source(&mut b).await.unwrap();
        let repo = MangaRepositoryImpl::new(pool);

        let mut first = Manga {
            source_id: a.id,
            slug: "same".to_string(),
            title: "Same".to_string(),
            ..Default::default()
        };
        repo.insert_manga(&mut first).await.unwrap();

        let mut elsewhere = Manga {
            source_id: b.id,
            ..first.clone()
        };
        repo.insert_manga(&mut elsewhere).await.unwrap();

        let mut duplicate = first.clone();
        assert!(repo.insert_manga(&mut duplicate).await.is_err());
    }
}
