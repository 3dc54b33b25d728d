//! Quiz history queries.

use sqlx::SqlitePool;

use super::DbResult;

/// One quiz session's headline numbers.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuizStat {
    pub quiz_id: i64,
    pub username: String,
    pub taken_on: String,
    pub score: i64,
    pub total_score: i64,
}

/// A single graded answer, as persisted.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub word_id: Option<i64>,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Per-word outcome joined with when the session was taken. Feeds the
/// spaced-repetition scheduler.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WordOutcome {
    pub word_id: i64,
    pub taken_on: String,
    pub is_correct: bool,
}

/// Aggregates across a user's sessions.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AggregateStats {
    pub sessions: i64,
    pub total_score: Option<i64>,
    pub total_possible: Option<i64>,
    pub best: Option<i64>,
    pub worst: Option<i64>,
    pub average: Option<f64>,
}

/// Record a finished session: one stats row plus one row per answer,
/// committed atomically. Returns the new quiz id.
pub async fn record_session(
    pool: &SqlitePool,
    username: &str,
    taken_on: &str,
    answers: &[AnswerRecord],
) -> DbResult<i64> {
    let score = answers.iter().filter(|a| a.is_correct).count() as i64;
    let total = answers.len() as i64;

    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query(
        "INSERT INTO quiz_stats (username, taken_on, score, total_score) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(taken_on)
    .bind(score)
    .bind(total)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for answer in answers {
        sqlx::query(
            "INSERT INTO quiz_results
                 (quiz_id, word_id, question, user_answer, correct_answer, is_correct)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(quiz_id)
        .bind(answer.word_id)
        .bind(&answer.question)
        .bind(&answer.user_answer)
        .bind(&answer.correct_answer)
        .bind(answer.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(quiz_id)
}

/// Every recorded outcome with a known word, oldest session first.
pub async fn outcomes(pool: &SqlitePool) -> DbResult<Vec<WordOutcome>> {
    let rows = sqlx::query_as::<_, WordOutcome>(
        "SELECT r.word_id AS word_id, s.taken_on AS taken_on, r.is_correct AS is_correct
         FROM quiz_results r
         JOIN quiz_stats s ON s.quiz_id = r.quiz_id
         WHERE r.word_id IS NOT NULL
         ORDER BY s.taken_on, r.id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Outcome history for one word, oldest first.
pub async fn history_for_word(pool: &SqlitePool, word_id: i64) -> DbResult<Vec<WordOutcome>> {
    let rows = sqlx::query_as::<_, WordOutcome>(
        "SELECT r.word_id AS word_id, s.taken_on AS taken_on, r.is_correct AS is_correct
         FROM quiz_results r
         JOIN quiz_stats s ON s.quiz_id = r.quiz_id
         WHERE r.word_id = ?
         ORDER BY s.taken_on, r.id",
    )
    .bind(word_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn sessions_for_user(
    pool: &SqlitePool,
    username: &str,
    limit: i64,
) -> DbResult<Vec<QuizStat>> {
    let rows = sqlx::query_as::<_, QuizStat>(
        "SELECT * FROM quiz_stats WHERE username = ? ORDER BY taken_on DESC LIMIT ?",
    )
    .bind(username)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn recent_sessions(pool: &SqlitePool, limit: i64) -> DbResult<Vec<QuizStat>> {
    let rows = sqlx::query_as::<_, QuizStat>(
        "SELECT * FROM quiz_stats ORDER BY taken_on DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Session count, totals, and min/max/avg score for one user.
pub async fn aggregate_for_user(pool: &SqlitePool, username: &str) -> DbResult<AggregateStats> {
    let stats = sqlx::query_as::<_, AggregateStats>(
        "SELECT COUNT(*) AS sessions,
                SUM(score) AS total_score,
                SUM(total_score) AS total_possible,
                MAX(score) AS best,
                MIN(score) AS worst,
                AVG(score) AS average
         FROM quiz_stats WHERE username = ?",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
