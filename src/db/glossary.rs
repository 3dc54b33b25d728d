//! Glossary queries.

use chrono::Utc;
use sqlx::SqlitePool;

use super::DbResult;

/// A learned word with one of its meanings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GlossaryEntry {
    pub id: i64,
    pub sanskrit_word: String,
    pub english_meaning: String,
    pub input_sentence: Option<String>,
    pub added_on: String,
}

/// Insert a word/meaning pair. Returns true if it was newly added.
pub async fn add_word(
    pool: &SqlitePool,
    word: &str,
    meaning: &str,
    sentence: Option<&str>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO glossary (sanskrit_word, english_meaning, input_sentence, added_on)
         VALUES (?, ?, ?, ?)",
    )
    .bind(word)
    .bind(meaning)
    .bind(sentence)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Register a batch of word/meaning pairs, returning how many were new.
pub async fn add_words(
    pool: &SqlitePool,
    pairs: &[(String, String)],
    sentence: Option<&str>,
) -> DbResult<usize> {
    let mut added = 0;
    for (word, meaning) in pairs {
        if add_word(pool, word, meaning, sentence).await? {
            added += 1;
        }
    }
    Ok(added)
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<GlossaryEntry>> {
    let entry = sqlx::query_as::<_, GlossaryEntry>("SELECT * FROM glossary WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(entry)
}

pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> DbResult<Vec<GlossaryEntry>> {
    let entries = sqlx::query_as::<_, GlossaryEntry>(
        "SELECT * FROM glossary ORDER BY added_on DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Case-insensitive substring search over words and meanings.
pub async fn search(pool: &SqlitePool, query: &str) -> DbResult<Vec<GlossaryEntry>> {
    let pattern = format!("%{}%", query);
    let entries = sqlx::query_as::<_, GlossaryEntry>(
        "SELECT * FROM glossary
         WHERE sanskrit_word LIKE ? OR english_meaning LIKE ?
         ORDER BY sanskrit_word, id",
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// All meanings recorded for an exact word.
pub async fn meanings_of(pool: &SqlitePool, word: &str) -> DbResult<Vec<String>> {
    let meanings: Vec<(String,)> =
        sqlx::query_as("SELECT english_meaning FROM glossary WHERE sanskrit_word = ? ORDER BY id")
            .bind(word)
            .fetch_all(pool)
            .await?;
    Ok(meanings.into_iter().map(|row| row.0).collect())
}

pub async fn count(pool: &SqlitePool) -> DbResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM glossary")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Ids of every glossary entry, oldest first.
pub async fn all_ids(pool: &SqlitePool) -> DbResult<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM glossary ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Distractor meanings: random meanings belonging to other words.
pub async fn meanings_except(
    pool: &SqlitePool,
    word: &str,
    limit: i64,
) -> DbResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT english_meaning FROM glossary
         WHERE sanskrit_word != ?
         ORDER BY RANDOM() LIMIT ?",
    )
    .bind(word)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|row| row.0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    #[tokio::test]
    async fn test_add_word_is_idempotent() {
        let db = Db::open_in_memory().await.unwrap();
        assert!(add_word(db.pool(), "धर्म", "duty", None).await.unwrap());
        assert!(!add_word(db.pool(), "धर्म", "duty", None).await.unwrap());
        assert!(add_word(db.pool(), "धर्म", "law", None).await.unwrap());
        assert_eq!(count(db.pool()).await.unwrap(), 2);
        assert_eq!(
            meanings_of(db.pool(), "धर्म").await.unwrap(),
            vec!["duty".to_string(), "law".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_and_distractors() {
        let db = Db::open_in_memory().await.unwrap();
        add_word(db.pool(), "धर्म", "duty", Some("धर्मक्षेत्रे")).await.unwrap();
        add_word(db.pool(), "क्षेत्र", "field", None).await.unwrap();
        add_word(db.pool(), "योग", "union", None).await.unwrap();

        let hits = search(db.pool(), "field").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sanskrit_word, "क्षेत्र");

        let distractors = meanings_except(db.pool(), "धर्म", 10).await.unwrap();
        assert_eq!(distractors.len(), 2);
        assert!(!distractors.contains(&"duty".to_string()));
    }

    #[tokio::test]
    async fn test_add_words_counts_new_only() {
        let db = Db::open_in_memory().await.unwrap();
        let pairs = vec![
            ("धर्म".to_string(), "duty".to_string()),
            ("धर्म".to_string(), "duty".to_string()),
            ("योग".to_string(), "union".to_string()),
        ];
        let added = add_words(db.pool(), &pairs, Some("verse")).await.unwrap();
        assert_eq!(added, 2);
    }
}
