// Watchlist and continue-watching operations.
//
// Both lists are per-user, deduplicated by content id. The watchlist keeps
// insertion order; the history list keeps most-recent-first order by bumping
// a per-user sequence on every play. Each operation is a handful of
// statements with no transaction: concurrent requests for the same user are
// last-writer-wins, which matches the low write-concurrency profile of the
// domain.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::{User, WatchItem};

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Update username and/or password hash; returns false if the email is unknown
pub async fn update_profile(
    pool: &SqlitePool,
    email: &str,
    new_username: Option<&str>,
    new_password_hash: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            username = COALESCE(?, username),
            password_hash = COALESCE(?, password_hash)
        WHERE email = ?
        "#,
    )
    .bind(new_username)
    .bind(new_password_hash)
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn watchlist(pool: &SqlitePool, user_id: &str) -> Result<Vec<WatchItem>> {
    let items = sqlx::query_as(
        r#"
        SELECT content_id AS id, title, image, category, rating
        FROM watchlist_items
        WHERE user_id = ?
        ORDER BY sort_order ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn history(pool: &SqlitePool, user_id: &str) -> Result<Vec<WatchItem>> {
    let items = sqlx::query_as(
        r#"
        SELECT content_id AS id, title, image, category, rating
        FROM history_items
        WHERE user_id = ?
        ORDER BY sort_order DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Idempotent add: a second add of the same content id leaves the list unchanged
pub async fn add_to_watchlist(
    pool: &SqlitePool,
    user_id: &str,
    item: &WatchItem,
) -> Result<Vec<WatchItem>> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO watchlist_items
            (user_id, content_id, title, image, category, rating, sort_order)
        VALUES (?, ?, ?, ?, ?, ?,
            (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM watchlist_items WHERE user_id = ?))
        "#,
    )
    .bind(user_id)
    .bind(item.id)
    .bind(&item.title)
    .bind(&item.image)
    .bind(&item.category)
    .bind(item.rating)
    .bind(user_id)
    .execute(pool)
    .await?;

    watchlist(pool, user_id).await
}

/// Removing an id that is not on the list is a no-op
pub async fn remove_from_watchlist(
    pool: &SqlitePool,
    user_id: &str,
    content_id: i64,
) -> Result<Vec<WatchItem>> {
    sqlx::query("DELETE FROM watchlist_items WHERE user_id = ? AND content_id = ?")
        .bind(user_id)
        .bind(content_id)
        .execute(pool)
        .await?;

    watchlist(pool, user_id).await
}

/// Record a play: inserts the item or, if already present, bumps it to the
/// front of the continue-watching list (no duplicates)
pub async fn record_history(
    pool: &SqlitePool,
    user_id: &str,
    item: &WatchItem,
) -> Result<Vec<WatchItem>> {
    sqlx::query(
        r#"
        INSERT INTO history_items
            (user_id, content_id, title, image, category, rating, sort_order, watched_at)
        VALUES (?, ?, ?, ?, ?, ?,
            (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM history_items WHERE user_id = ?), ?)
        ON CONFLICT (user_id, content_id) DO UPDATE SET
            title = excluded.title,
            image = excluded.image,
            category = excluded.category,
            rating = excluded.rating,
            sort_order = excluded.sort_order,
            watched_at = excluded.watched_at
        "#,
    )
    .bind(user_id)
    .bind(item.id)
    .bind(&item.title)
    .bind(&item.image)
    .bind(&item.category)
    .bind(item.rating)
    .bind(user_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    history(pool, user_id).await
}

pub async fn remove_from_history(
    pool: &SqlitePool,
    user_id: &str,
    content_id: i64,
) -> Result<Vec<WatchItem>> {
    sqlx::query("DELETE FROM history_items WHERE user_id = ? AND content_id = ?")
        .bind(user_id)
        .bind(content_id)
        .execute(pool)
        .await?;

    history(pool, user_id).await
}
