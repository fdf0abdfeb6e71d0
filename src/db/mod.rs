use anyhow::Result;
use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        -- Ordered per-user watchlist; sort_order preserves insertion order
        CREATE TABLE IF NOT EXISTS watchlist_items (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content_id INTEGER NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            image TEXT,
            category TEXT,
            rating REAL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, content_id)
        );

        -- Continue-watching list; sort_order is bumped on every play so
        -- ORDER BY sort_order DESC yields most-recent-first
        CREATE TABLE IF NOT EXISTS history_items (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content_id INTEGER NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            image TEXT,
            category TEXT,
            rating REAL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            watched_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, content_id)
        );

        -- Single catalog table; category is the movie/series/anime discriminant.
        -- Ids are a monotonic sequence (numeric on the wire).
        CREATE TABLE IF NOT EXISTS content_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            rating REAL,
            image TEXT,
            video_url TEXT,
            trailer_url TEXT,
            category TEXT NOT NULL,
            year TEXT,
            cast_list TEXT,
            genres TEXT NOT NULL DEFAULT '[]',
            views INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS seasons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_id INTEGER NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            image TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            UNIQUE (content_id, name)
        );

        CREATE TABLE IF NOT EXISTS episodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            url TEXT,
            duration TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0
        );

        -- Hero carousel entries; not tied to content rows by foreign key
        -- (a banner can outlive or predate its content item)
        CREATE TABLE IF NOT EXISTS banners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            description TEXT,
            image TEXT,
            tag TEXT,
            video_url TEXT,
            category TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

/// Create all database indexes for the common query paths
async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = [
        // Catalog listing: filter by category
        "CREATE INDEX IF NOT EXISTS idx_content_category ON content_items(category)",
        // Analytics: top-N by views
        "CREATE INDEX IF NOT EXISTS idx_content_views ON content_items(views)",
        // Season/episode assembly
        "CREATE INDEX IF NOT EXISTS idx_seasons_content ON seasons(content_id)",
        "CREATE INDEX IF NOT EXISTS idx_episodes_season ON episodes(season_id)",
        // Per-user list loads
        "CREATE INDEX IF NOT EXISTS idx_watchlist_user ON watchlist_items(user_id, sort_order)",
        "CREATE INDEX IF NOT EXISTS idx_history_user ON history_items(user_id, sort_order)",
    ];

    for index_sql in indexes {
        if let Err(e) = sqlx::query(index_sql).execute(pool).await {
            tracing::warn!("Failed to create index: {} - {}", index_sql, e);
        }
    }

    tracing::debug!("Database indexes created/verified");

    Ok(())
}
