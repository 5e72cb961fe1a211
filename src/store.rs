// src/store.rs
//! SQLite-backed article store.
//!
//! One logical collection per source lives in a single `articles` table with
//! a `source` discriminator and a `UNIQUE(source, link)` constraint: at most
//! one record per link within a source, while the same link under two sources
//! stays two independent rows. Timestamps are unix seconds; `categories` is a
//! JSON array column.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// One durable, deduplicated unit of ingested content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub source: String,
    pub link: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    /// Absent means "unknown", not "now".
    pub published_at: Option<DateTime<Utc>>,
    pub categories: BTreeSet<String>,
    /// Set at first insertion, never mutated afterwards.
    pub created_at: DateTime<Utc>,
    pub last_scraped_at: DateTime<Utc>,
}

/// The mutable field set written on every merge. The store stamps
/// `created_at` on insert and `last_scraped_at` on both paths.
#[derive(Debug, Clone)]
pub struct ArticleUpsert {
    pub source: String,
    pub link: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub categories: BTreeSet<String>,
}

#[derive(Clone)]
pub struct ArticleStore {
    pool: SqlitePool,
}

impl ArticleStore {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Ephemeral store for tests and dry runs. Single connection, because
    /// every new `:memory:` connection is a fresh database.
    pub async fn connect_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                link TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                content TEXT,
                image_url TEXT,
                author TEXT,
                published_at INTEGER,
                categories TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                last_scraped_at INTEGER NOT NULL,
                UNIQUE(source, link)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_source_published
             ON articles(source, published_at DESC)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn contains(&self, source: &str, link: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM articles WHERE source = ? AND link = ?")
                .bind(source)
                .bind(link)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a previously-unseen link. `created_at` is stamped here and
    /// never touched again.
    pub async fn insert(&self, article: &ArticleUpsert) -> Result<()> {
        let now = Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO articles (source, link, title, description, content, image_url,
                                  author, published_at, categories, created_at, last_scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.source)
        .bind(&article.link)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.image_url)
        .bind(&article.author)
        .bind(article.published_at.map(|dt| dt.timestamp()))
        .bind(categories_json(&article.categories))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing record in place.
    pub async fn update(&self, article: &ArticleUpsert) -> Result<()> {
        let now = Utc::now().timestamp();
        sqlx::query(
            r#"
            UPDATE articles
            SET title = ?, description = ?, content = ?, image_url = ?, author = ?,
                published_at = ?, categories = ?, last_scraped_at = ?
            WHERE source = ? AND link = ?
            "#,
        )
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.image_url)
        .bind(&article.author)
        .bind(article.published_at.map(|dt| dt.timestamp()))
        .bind(categories_json(&article.categories))
        .bind(now)
        .bind(&article.source)
        .bind(&article.link)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, source: &str, link: &str) -> Result<Option<ArticleRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM articles WHERE source = ? AND link = ?"
        ))
        .bind(source)
        .bind(link)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| row_to_record(&r)).transpose()
    }

    /// Newest-first listing for one source. Records with unknown publish time
    /// sort last.
    pub async fn list_recent(&self, source: &str, limit: i64) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM articles WHERE source = ?
             ORDER BY published_at DESC LIMIT ?"
        ))
        .bind(source)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Cross-source listing: up to `per_source_limit` newest per source,
    /// merged newest-first, truncated to `overall_limit`.
    pub async fn list_recent_all(
        &self,
        sources: &[String],
        per_source_limit: i64,
        overall_limit: usize,
    ) -> Result<Vec<ArticleRecord>> {
        let mut all = Vec::new();
        for source in sources {
            all.extend(self.list_recent(source, per_source_limit).await?);
        }
        all.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        all.truncate(overall_limit);
        Ok(all)
    }

    /// Case-insensitive substring search over title, description, and
    /// content, across all sources.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<ArticleRecord>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM articles
             WHERE title LIKE ?1 OR description LIKE ?1 OR content LIKE ?1
             ORDER BY published_at DESC LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Delete records of one source published strictly before `cutoff`.
    /// Rows with unknown publish time never match.
    pub async fn delete_published_before(
        &self,
        source: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM articles
             WHERE source = ? AND published_at IS NOT NULL AND published_at < ?",
        )
        .bind(source)
        .bind(cutoff.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self, source: &str) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE source = ?")
            .bind(source)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

const COLUMNS: &str = "source, link, title, description, content, image_url, author, \
                       published_at, categories, created_at, last_scraped_at";

fn categories_json(categories: &BTreeSet<String>) -> String {
    serde_json::to_string(categories).unwrap_or_else(|_| "[]".to_string())
}

fn row_to_record(row: &SqliteRow) -> Result<ArticleRecord> {
    let categories: String = row.get("categories");
    let categories: BTreeSet<String> = serde_json::from_str(&categories)
        .with_context(|| format!("decoding categories column: {categories}"))?;

    let created_at: i64 = row.get("created_at");
    let last_scraped_at: i64 = row.get("last_scraped_at");
    let published_at: Option<i64> = row.get("published_at");

    Ok(ArticleRecord {
        source: row.get("source"),
        link: row.get("link"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        image_url: row.get("image_url"),
        author: row.get("author"),
        published_at: published_at.and_then(|s| DateTime::from_timestamp(s, 0)),
        categories,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_default(),
        last_scraped_at: DateTime::from_timestamp(last_scraped_at, 0).unwrap_or_default(),
    })
}
