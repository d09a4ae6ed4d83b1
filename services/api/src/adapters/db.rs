//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `BookStore`, `WordStore` and `WordFrequencyStore` ports from the `core`
//! crate. It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use palabra_core::domain::{Book, NewBook, NewWord, Word, WordCount};
use palabra_core::ports::{
    recent_books_limit, BookStore, PortError, PortResult, WordFrequencyStore, WordStore,
};
use palabra_core::query::WordQuery;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports on PostgreSQL.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const BOOK_COLUMNS: &str =
    "id, title, filename, original_filename, language, user_id, status, created, processed";

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    filename: String,
    original_filename: String,
    language: String,
    user_id: Option<i32>,
    status: String,
    created: DateTime<Utc>,
    processed: Option<DateTime<Utc>>,
}
impl BookRecord {
    fn to_domain(self) -> PortResult<Book> {
        let status = self.status.parse().map_err(PortError::Unexpected)?;
        Ok(Book {
            id: self.id,
            title: self.title,
            filename: self.filename,
            original_filename: self.original_filename,
            language: self.language,
            user_id: self.user_id,
            status,
            created: self.created,
            processed: self.processed,
        })
    }
}

#[derive(FromRow)]
struct WordRecord {
    id: i32,
    word: String,
    language: String,
    difficulty: Option<i32>,
    zipf_score: Option<f64>,
    created: DateTime<Utc>,
}
impl WordRecord {
    fn to_domain(self) -> Word {
        Word {
            id: self.id,
            word: self.word,
            language: self.language,
            difficulty: self.difficulty,
            zipf_score: self.zipf_score,
            created: self.created,
        }
    }
}

#[derive(FromRow)]
struct WordCountRecord {
    #[sqlx(flatten)]
    word: WordRecord,
    count: i32,
}
impl WordCountRecord {
    fn to_domain(self) -> WordCount {
        WordCount {
            word: self.word.to_domain(),
            count: self.count,
        }
    }
}

//=========================================================================================
// Dynamic Word-Frequency Query
//=========================================================================================

/// Builds the per-book word query. Each supplied filter adds exactly one
/// `AND` clause with a bound parameter; omitted filters add nothing. Only the
/// sort keyword is spliced into the text, and it comes from a closed enum.
pub fn book_words_query(book_id: Uuid, query: &WordQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT w.id, w.word, w.language, w.difficulty, w.zipf_score, w.created, bw.count \
         FROM book_words bw \
         JOIN words w ON w.id = bw.word_id \
         WHERE bw.book_id = ",
    );
    qb.push_bind(book_id);

    if let Some(difficulty) = query.difficulty {
        qb.push(" AND w.difficulty = ").push_bind(difficulty);
    }
    if let Some(min_count) = query.min_count {
        qb.push(" AND bw.count >= ").push_bind(min_count);
    }
    if let Some(max_count) = query.max_count {
        qb.push(" AND bw.count <= ").push_bind(max_count);
    }

    // Ties on count are broken by word id so pages are stable.
    qb.push(" ORDER BY bw.count ")
        .push(query.sort.as_sql())
        .push(", w.id ASC");
    qb.push(" LIMIT ").push_bind(query.limit);
    qb.push(" OFFSET ").push_bind(query.offset);
    qb
}

//=========================================================================================
// `BookStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BookStore for DbAdapter {
    async fn create(&self, book: NewBook) -> PortResult<Book> {
        let sql = format!(
            "INSERT INTO books (id, title, filename, original_filename, language, user_id, status, created) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW()) \
             RETURNING {}",
            BOOK_COLUMNS
        );
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.filename)
            .bind(&book.original_filename)
            .bind(&book.language)
            .bind(book.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PortError::DuplicateIdentity(format!("Book {} already exists", book.id))
                }
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn get_by_id(&self, id: Uuid) -> PortResult<Book> {
        let sql = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Book {} not found", id)),
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn list_recent(&self, limit: i64) -> PortResult<Vec<Book>> {
        let sql = format!(
            "SELECT {} FROM books ORDER BY created DESC LIMIT $1",
            BOOK_COLUMNS
        );
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(recent_books_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }
}

//=========================================================================================
// `WordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl WordStore for DbAdapter {
    async fn upsert_word(&self, word: NewWord) -> PortResult<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO words (word, language, difficulty, zipf_score, created) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (word, language) \
             DO UPDATE SET difficulty = EXCLUDED.difficulty, zipf_score = EXCLUDED.zipf_score \
             RETURNING id",
        )
        .bind(&word.word)
        .bind(&word.language)
        .bind(word.difficulty)
        .bind(word.zipf_score)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(id)
    }

    async fn get_word(&self, id: i32) -> PortResult<Word> {
        let record = sqlx::query_as::<_, WordRecord>(
            "SELECT id, word, language, difficulty, zipf_score, created FROM words WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Word {} not found", id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `WordFrequencyStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl WordFrequencyStore for DbAdapter {
    async fn record_occurrence(&self, book_id: Uuid, word_id: i32, count: i32) -> PortResult<()> {
        if count <= 0 {
            return Err(PortError::InvalidInput(format!(
                "occurrence count must be positive, got {}",
                count
            )));
        }
        // Single statement so concurrent passes for the same pair cannot lose an update.
        sqlx::query(
            "INSERT INTO book_words (book_id, word_id, count) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (book_id, word_id) \
             DO UPDATE SET count = book_words.count + EXCLUDED.count",
        )
        .bind(book_id)
        .bind(word_id)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Book {} or word {} not found", book_id, word_id))
            }
            _ => unexpected(e),
        })?;
        Ok(())
    }

    async fn book_words(&self, book_id: Uuid, query: &WordQuery) -> PortResult<Vec<WordCount>> {
        let mut qb = book_words_query(book_id, query);
        let records = qb
            .build_query_as::<WordCountRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn counts_for_book(&self, book_id: Uuid) -> PortResult<HashMap<i32, i32>> {
        let rows: Vec<(i32, i32)> =
            sqlx::query_as("SELECT word_id, count FROM book_words WHERE book_id = $1")
                .bind(book_id)
                .fetch_all(&self.pool)
                .await
                .map_err(unexpected)?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palabra_core::query::SortOrder;

    #[test]
    fn omitted_filters_add_no_clauses() {
        let qb = book_words_query(Uuid::new_v4(), &WordQuery::default());
        let sql = qb.sql();

        assert!(sql.contains("WHERE bw.book_id = $1 ORDER BY"));
        assert!(!sql.contains("w.difficulty ="));
        assert!(!sql.contains("bw.count >="));
        assert!(!sql.contains("bw.count <="));
        assert!(sql.contains("ORDER BY bw.count DESC, w.id ASC"));
        assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn supplied_filters_are_bound_in_order() {
        let query = WordQuery {
            difficulty: Some(0),
            min_count: Some(10),
            max_count: Some(20),
            sort: SortOrder::Asc,
            limit: 2,
            offset: 1,
        };
        let qb = book_words_query(Uuid::new_v4(), &query);
        let sql = qb.sql();

        assert!(sql.contains(
            "WHERE bw.book_id = $1 AND w.difficulty = $2 AND bw.count >= $3 AND bw.count <= $4"
        ));
        assert!(sql.contains("ORDER BY bw.count ASC, w.id ASC"));
        assert!(sql.ends_with("LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn parameter_positions_follow_only_present_filters() {
        let query = WordQuery {
            max_count: Some(3),
            ..Default::default()
        };
        let qb = book_words_query(Uuid::new_v4(), &query);
        let sql = qb.sql();

        assert!(sql.contains("WHERE bw.book_id = $1 AND bw.count <= $2 ORDER BY"));
        assert!(sql.ends_with("LIMIT $3 OFFSET $4"));
    }
}
