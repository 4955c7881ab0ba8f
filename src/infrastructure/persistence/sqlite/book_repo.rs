//! SQLite Book Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::path::PathBuf;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{BookRecord, BookRepositoryPort, LibraryOrder, RepositoryError};
use crate::domain::book::{Analysis, Book, BookFormat, BookId, Chapter, Entity, Title};

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    title: String,
    author: String,
    filename: String,
    format: String,
    text_path: String,
    file_size: i64,
    thumbnail: Option<String>,
    upload_date: String,
}

impl TryFrom<BookRow> for BookRecord {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let title = Title::new(row.title)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let format = BookFormat::from_str(&row.format)
            .ok_or_else(|| RepositoryError::SerializationError(format!("bad format: {}", row.format)))?;
        let upload_date = DateTime::parse_from_rfc3339(&row.upload_date)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
            .with_timezone(&Utc);

        Ok(Book::from_parts(
            BookId::from_uuid(id),
            title,
            row.author,
            row.filename,
            format,
            PathBuf::from(row.text_path),
            row.file_size as u64,
            row.thumbnail,
            upload_date,
        ))
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    summary: String,
    entities: String,
    scenes: String,
    keywords: String,
    chapters: String,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = RepositoryError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let entities: Vec<Entity> = serde_json::from_str(&row.entities)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let scenes: Vec<String> = serde_json::from_str(&row.scenes)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let keywords: Vec<String> = serde_json::from_str(&row.keywords)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let chapters: Vec<Chapter> = serde_json::from_str(&row.chapters)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        // 持久化的条目在写入时已经去重，读回不再重新裁剪
        Ok(Analysis {
            summary: row.summary,
            entities,
            scenes,
            keywords,
            chapters,
        })
    }
}

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn save(&self, book: &BookRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, filename, format, text_path, file_size, thumbnail, upload_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                thumbnail = excluded.thumbnail
            "#,
        )
        .bind(book.id().to_string())
        .bind(book.title().as_str())
        .bind(book.author())
        .bind(book.filename())
        .bind(book.format().as_str())
        .bind(book.text_path().to_string_lossy().to_string())
        .bind(book.file_size() as i64)
        .bind(book.thumbnail())
        .bind(book.upload_date().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<BookRecord>, RepositoryError> {
        let row: Option<BookRow> = sqlx::query_as(
            "SELECT id, title, author, filename, format, text_path, file_size, thumbnail, upload_date FROM books WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(BookRecord::try_from).transpose()
    }

    async fn find_all(&self, order: LibraryOrder) -> Result<Vec<BookRecord>, RepositoryError> {
        // 顺序是读取时的调用方选择，仓储不固化任何默认排序
        let order_clause = match order {
            LibraryOrder::DateDesc => "upload_date DESC",
            LibraryOrder::DateAsc => "upload_date ASC",
            LibraryOrder::Title => "title COLLATE NOCASE ASC",
        };
        let query = format!(
            "SELECT id, title, author, filename, format, text_path, file_size, thumbnail, upload_date FROM books ORDER BY {}",
            order_clause
        );

        let rows: Vec<BookRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(BookRecord::try_from).collect()
    }

    async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        // 单事务级联：调用方看不到半删状态
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        sqlx::query("DELETE FROM analyses WHERE book_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            // 回滚，不留下孤立的 analyses 删除
            let _ = tx.rollback().await;
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn save_analysis(
        &self,
        book_id: BookId,
        analysis: &Analysis,
    ) -> Result<(), RepositoryError> {
        let entities = serde_json::to_string(&analysis.entities)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let scenes = serde_json::to_string(&analysis.scenes)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let keywords = serde_json::to_string(&analysis.keywords)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let chapters = serde_json::to_string(&analysis.chapters)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        // 重新分析 = 整行替换，Book 永远至多一个在档 Analysis
        sqlx::query(
            r#"
            INSERT INTO analyses (book_id, summary, entities, scenes, keywords, chapters, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(book_id) DO UPDATE SET
                summary = excluded.summary,
                entities = excluded.entities,
                scenes = excluded.scenes,
                keywords = excluded.keywords,
                chapters = excluded.chapters,
                created_at = excluded.created_at
            "#,
        )
        .bind(book_id.to_string())
        .bind(&analysis.summary)
        .bind(entities)
        .bind(scenes)
        .bind(keywords)
        .bind(chapters)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_analysis(&self, book_id: BookId) -> Result<Option<Analysis>, RepositoryError> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            "SELECT summary, entities, scenes, keywords, chapters FROM analyses WHERE book_id = ?",
        )
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(Analysis::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookRepository::new(pool)
    }

    fn make_book(title: &str) -> Book {
        Book::new(
            Title::new(title).unwrap(),
            "Author",
            format!("{}.txt", title.to_lowercase().replace(' ', "_")),
            BookFormat::Txt,
            PathBuf::from("x/book.txt"),
            128,
        )
    }

    fn make_analysis() -> Analysis {
        Analysis::new(
            "A whale hunt.".to_string(),
            vec![
                Entity::new("Ahab", "captain").with_appearance("one leg"),
                Entity::new("Ishmael", "narrator"),
            ],
            vec!["A ship at sea".to_string()],
            vec!["obsession".to_string()],
            vec![],
            10,
        )
    }

    #[tokio::test]
    async fn test_save_and_find_roundtrip() {
        let repo = repo().await;
        let book = make_book("Moby Dick");

        repo.save(&book).await.unwrap();
        let found = repo.find_by_id(book.id()).await.unwrap().unwrap();

        assert_eq!(found.id(), book.id());
        assert_eq!(found.title().as_str(), "Moby Dick");
        assert_eq!(found.format(), BookFormat::Txt);
        assert_eq!(found.file_size(), 128);
    }

    #[tokio::test]
    async fn test_find_all_respects_caller_order() {
        let repo = repo().await;
        for title in ["Beta", "Alpha", "Gamma"] {
            repo.save(&make_book(title)).await.unwrap();
        }

        let by_title = repo.find_all(LibraryOrder::Title).await.unwrap();
        let titles: Vec<&str> = by_title.iter().map(|b| b.title().as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

        let by_date = repo.find_all(LibraryOrder::DateAsc).await.unwrap();
        assert_eq!(by_date.len(), 3);
    }

    #[tokio::test]
    async fn test_analysis_roundtrip_replaces_old() {
        let repo = repo().await;
        let book = make_book("Moby Dick");
        repo.save(&book).await.unwrap();

        repo.save_analysis(book.id(), &make_analysis()).await.unwrap();
        let loaded = repo.find_analysis(book.id()).await.unwrap().unwrap();
        assert_eq!(loaded.entities.len(), 2);
        assert_eq!(loaded.entities[0].appearance, "one leg");

        // 重新分析替换旧值
        let replacement = Analysis::new(
            "New summary.".to_string(),
            vec![],
            vec![],
            vec![],
            vec![],
            10,
        );
        repo.save_analysis(book.id(), &replacement).await.unwrap();
        let loaded = repo.find_analysis(book.id()).await.unwrap().unwrap();
        assert_eq!(loaded.summary, "New summary.");
        assert!(loaded.entities.is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_not_found() {
        let repo = repo().await;
        let book = make_book("Moby Dick");
        repo.save(&book).await.unwrap();
        repo.save_analysis(book.id(), &make_analysis()).await.unwrap();

        repo.delete(book.id()).await.unwrap();

        assert!(repo.find_by_id(book.id()).await.unwrap().is_none());
        assert!(repo.find_analysis(book.id()).await.unwrap().is_none());
        assert!(repo.find_all(LibraryOrder::DateDesc).await.unwrap().is_empty());

        // 二次删除报 NotFound
        assert!(matches!(
            repo.delete(book.id()).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
