// Catalog operations over the single tagged content table.
//
// The movie/series/anime split lives in the `category` column, so lookups,
// updates and deletes hit exactly one row instead of fanning out across
// three collections. Season and episode mutations are row-scoped statements;
// the view counter is a single atomic increment.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::{Banner, ContentDto, ContentRow, EpisodeDto, SeasonDto, SeasonRow};

pub const CATEGORY_MOVIE: &str = "movie";

/// Seed values for a freshly created series/anime with no seasons supplied
const DEFAULT_SEASON_NAME: &str = "Season 1";
const DEFAULT_EPISODE_TITLE: &str = "Episode 1";
const DEFAULT_EPISODE_DURATION: &str = "24m";

/// Badge text for banners spawned from featured content
const FEATURED_BANNER_TAG: &str = "New Release";

#[derive(Debug, Clone, Default)]
pub struct NewContent {
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub video_url: Option<String>,
    pub trailer_url: Option<String>,
    pub category: String,
    pub year: Option<String>,
    pub cast: Option<String>,
    pub genres: Vec<String>,
    pub featured: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub video_url: Option<String>,
    pub trailer_url: Option<String>,
    pub category: Option<String>,
    pub year: Option<String>,
    pub cast: Option<String>,
    pub genres: Option<Vec<String>>,
    pub views: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct BannerFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tag: Option<String>,
    pub video_url: Option<String>,
    pub category: Option<String>,
}

/// Create a content item; returns its id.
///
/// Side effects in order: the row itself, then the featured banner, then
/// the Season 1 seed for non-movie categories.
pub async fn create(pool: &SqlitePool, new: NewContent) -> Result<i64> {
    let trailer_url = new.trailer_url.clone().or_else(|| new.video_url.clone());
    let genres = serde_json::to_string(&new.genres)?;

    let id = sqlx::query(
        r#"
        INSERT INTO content_items
            (title, description, rating, image, video_url, trailer_url,
             category, year, cast_list, genres)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.rating)
    .bind(&new.image)
    .bind(&new.video_url)
    .bind(&trailer_url)
    .bind(&new.category)
    .bind(&new.year)
    .bind(&new.cast)
    .bind(&genres)
    .execute(pool)
    .await?
    .last_insert_rowid();

    if new.featured {
        create_banner(
            pool,
            BannerFields {
                title: Some(new.title.clone()),
                description: new.description.clone(),
                image: new.image.clone(),
                tag: Some(FEATURED_BANNER_TAG.to_string()),
                video_url: new.video_url.clone(),
                category: Some(new.category.clone()),
            },
        )
        .await?;
        tracing::info!("Spawned carousel banner for featured content {}", id);
    }

    if new.category != CATEGORY_MOVIE {
        let season_id = sqlx::query(
            "INSERT INTO seasons (content_id, name, image, sort_order) VALUES (?, ?, ?, 1)",
        )
        .bind(id)
        .bind(DEFAULT_SEASON_NAME)
        .bind(&new.image)
        .execute(pool)
        .await?
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO episodes (season_id, title, url, duration, sort_order) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(season_id)
        .bind(DEFAULT_EPISODE_TITLE)
        .bind(&new.video_url)
        .bind(DEFAULT_EPISODE_DURATION)
        .execute(pool)
        .await?;
    }

    Ok(id)
}

/// Field patch: only supplied fields change. Returns false for an unknown id.
pub async fn update(pool: &SqlitePool, id: i64, patch: ContentPatch) -> Result<bool> {
    let genres = patch
        .genres
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE content_items SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            rating = COALESCE(?, rating),
            image = COALESCE(?, image),
            video_url = COALESCE(?, video_url),
            trailer_url = COALESCE(?, trailer_url),
            category = COALESCE(?, category),
            year = COALESCE(?, year),
            cast_list = COALESCE(?, cast_list),
            genres = COALESCE(?, genres),
            views = COALESCE(?, views),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.rating)
    .bind(&patch.image)
    .bind(&patch.video_url)
    .bind(&patch.trailer_url)
    .bind(&patch.category)
    .bind(&patch.year)
    .bind(&patch.cast)
    .bind(&genres)
    .bind(patch.views)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a content item (seasons/episodes cascade). Spawned banners are
/// deliberately left in place.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_category(pool: &SqlitePool, category: &str) -> Result<Vec<ContentDto>> {
    let rows: Vec<ContentRow> =
        sqlx::query_as("SELECT * FROM content_items WHERE category = ? ORDER BY id ASC")
            .bind(category)
            .fetch_all(pool)
            .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let seasons = seasons_for(pool, row.id).await?;
        items.push(ContentDto::from_row(row, seasons));
    }
    Ok(items)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<ContentDto>> {
    let row: Option<ContentRow> = sqlx::query_as("SELECT * FROM content_items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let seasons = seasons_for(pool, row.id).await?;
            Ok(Some(ContentDto::from_row(row, seasons)))
        }
        None => Ok(None),
    }
}

pub async fn seasons_for(pool: &SqlitePool, content_id: i64) -> Result<Vec<SeasonDto>> {
    let rows: Vec<SeasonRow> =
        sqlx::query_as("SELECT * FROM seasons WHERE content_id = ? ORDER BY sort_order, id")
            .bind(content_id)
            .fetch_all(pool)
            .await?;

    let mut seasons = Vec::with_capacity(rows.len());
    for row in rows {
        let episodes: Vec<EpisodeDto> = sqlx::query_as(
            "SELECT title, url, duration FROM episodes WHERE season_id = ? ORDER BY sort_order, id",
        )
        .bind(row.id)
        .fetch_all(pool)
        .await?;
        seasons.push(SeasonDto {
            name: row.name,
            image: row.image,
            episodes,
        });
    }
    Ok(seasons)
}

/// Append an episode to the named season of a series/anime, creating the
/// season (with the content's poster) if it does not exist yet.
/// Returns the updated season list, or None when the content id is unknown
/// or refers to a movie.
pub async fn add_episode(
    pool: &SqlitePool,
    content_id: i64,
    season_name: &str,
    title: &str,
    url: Option<&str>,
    duration: Option<&str>,
) -> Result<Option<Vec<SeasonDto>>> {
    let content: Option<(String, Option<String>)> =
        sqlx::query_as("SELECT category, image FROM content_items WHERE id = ?")
            .bind(content_id)
            .fetch_optional(pool)
            .await?;

    let Some((category, image)) = content else {
        return Ok(None);
    };
    if category == CATEGORY_MOVIE {
        return Ok(None);
    }

    let season_id: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM seasons WHERE content_id = ? AND name = ?")
            .bind(content_id)
            .bind(season_name)
            .fetch_optional(pool)
            .await?;

    let season_id = match season_id {
        Some((id,)) => id,
        None => {
            sqlx::query(
                r#"
                INSERT INTO seasons (content_id, name, image, sort_order)
                VALUES (?, ?, ?,
                    (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM seasons WHERE content_id = ?))
                "#,
            )
            .bind(content_id)
            .bind(season_name)
            .bind(&image)
            .bind(content_id)
            .execute(pool)
            .await?
            .last_insert_rowid()
        }
    };

    sqlx::query(
        r#"
        INSERT INTO episodes (season_id, title, url, duration, sort_order)
        VALUES (?, ?, ?, ?,
            (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM episodes WHERE season_id = ?))
        "#,
    )
    .bind(season_id)
    .bind(title)
    .bind(url)
    .bind(duration)
    .bind(season_id)
    .execute(pool)
    .await?;

    Ok(Some(seasons_for(pool, content_id).await?))
}

/// Targeted poster update on one season row
pub async fn set_season_poster(
    pool: &SqlitePool,
    content_id: i64,
    season_name: &str,
    image: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE seasons SET image = ? WHERE content_id = ? AND name = ?")
        .bind(image)
        .bind(content_id)
        .bind(season_name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove one episode, located by content id + season name + episode title
pub async fn delete_episode(
    pool: &SqlitePool,
    content_id: i64,
    season_name: &str,
    title: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM episodes
        WHERE title = ?
          AND season_id = (SELECT id FROM seasons WHERE content_id = ? AND name = ?)
        "#,
    )
    .bind(title)
    .bind(content_id)
    .bind(season_name)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Atomic view-count increment; returns the new count, None for unknown ids
pub async fn increment_views(pool: &SqlitePool, id: i64) -> Result<Option<i64>> {
    let result = sqlx::query("UPDATE content_items SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let (views,): (i64,) = sqlx::query_as("SELECT views FROM content_items WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(Some(views))
}

/// Point-in-time ranking across every category: top `limit` by views
/// descending, ties broken by id ascending for a stable order
pub async fn top_by_views(pool: &SqlitePool, limit: i64) -> Result<Vec<ContentDto>> {
    let rows: Vec<ContentRow> =
        sqlx::query_as("SELECT * FROM content_items ORDER BY views DESC, id ASC LIMIT ?")
            .bind(limit)
            .fetch_all(pool)
            .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let seasons = seasons_for(pool, row.id).await?;
        items.push(ContentDto::from_row(row, seasons));
    }
    Ok(items)
}

// ============================================================================
// Banners (hero carousel)
// ============================================================================

pub async fn list_banners(pool: &SqlitePool) -> Result<Vec<Banner>> {
    let banners = sqlx::query_as("SELECT * FROM banners ORDER BY id ASC")
        .fetch_all(pool)
        .await?;
    Ok(banners)
}

pub async fn create_banner(pool: &SqlitePool, fields: BannerFields) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO banners (title, description, image, tag, video_url, category)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.image)
    .bind(&fields.tag)
    .bind(&fields.video_url)
    .bind(&fields.category)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn update_banner(pool: &SqlitePool, id: i64, fields: BannerFields) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE banners SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            image = COALESCE(?, image),
            tag = COALESCE(?, tag),
            video_url = COALESCE(?, video_url),
            category = COALESCE(?, category)
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.image)
    .bind(&fields.tag)
    .bind(&fields.video_url)
    .bind(&fields.category)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_banner(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM banners WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();
        pool
    }

    fn movie(title: &str) -> NewContent {
        NewContent {
            title: title.to_string(),
            category: CATEGORY_MOVIE.to_string(),
            video_url: Some("https://cdn/movie.mp4".to_string()),
            image: Some("https://cdn/poster.jpg".to_string()),
            rating: Some(8.1),
            genres: vec!["Action".to_string()],
            ..Default::default()
        }
    }

    fn series(title: &str) -> NewContent {
        NewContent {
            title: title.to_string(),
            category: "series".to_string(),
            video_url: Some("https://cdn/pilot.mp4".to_string()),
            image: Some("https://cdn/series.jpg".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_movie_has_no_seasons() {
        let pool = test_pool().await;
        let id = create(&pool, movie("Heat")).await.unwrap();

        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.category, "movie");
        assert!(dto.seasons.is_empty());
        assert_eq!(dto.views, 0);
        assert_eq!(dto.genres, vec!["Action"]);
    }

    #[tokio::test]
    async fn test_series_seeds_season_one() {
        let pool = test_pool().await;
        let id = create(&pool, series("Dark")).await.unwrap();

        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.seasons.len(), 1);
        assert_eq!(dto.seasons[0].name, "Season 1");
        assert_eq!(dto.seasons[0].image.as_deref(), Some("https://cdn/series.jpg"));
        assert_eq!(dto.seasons[0].episodes.len(), 1);
        assert_eq!(dto.seasons[0].episodes[0].title, "Episode 1");
        assert_eq!(dto.seasons[0].episodes[0].url.as_deref(), Some("https://cdn/pilot.mp4"));
        assert_eq!(dto.seasons[0].episodes[0].duration.as_deref(), Some("24m"));
    }

    #[tokio::test]
    async fn test_trailer_falls_back_to_video_url() {
        let pool = test_pool().await;
        let id = create(&pool, movie("Heat")).await.unwrap();

        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.trailer_url, dto.video_url);

        let mut with_trailer = movie("Ronin");
        with_trailer.trailer_url = Some("https://cdn/trailer.mp4".to_string());
        let id = create(&pool, with_trailer).await.unwrap();
        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.trailer_url.as_deref(), Some("https://cdn/trailer.mp4"));
    }

    #[tokio::test]
    async fn test_featured_spawns_banner() {
        let pool = test_pool().await;

        let mut featured = movie("Heat");
        featured.featured = true;
        create(&pool, featured).await.unwrap();

        let banners = list_banners(&pool).await.unwrap();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].title.as_deref(), Some("Heat"));
        assert_eq!(banners[0].tag.as_deref(), Some("New Release"));
        assert_eq!(banners[0].category.as_deref(), Some("movie"));
        assert_eq!(banners[0].image.as_deref(), Some("https://cdn/poster.jpg"));

        // Non-featured content spawns nothing
        create(&pool, movie("Ronin")).await.unwrap();
        assert_eq!(list_banners(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_episode_to_existing_and_new_season() {
        let pool = test_pool().await;
        let id = create(&pool, series("Dark")).await.unwrap();

        // Existing season: appended after the seed episode
        let seasons = add_episode(&pool, id, "Season 1", "Episode 2", Some("https://cdn/e2.mp4"), Some("45m"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].episodes.len(), 2);
        assert_eq!(seasons[0].episodes[1].title, "Episode 2");

        // Unknown season name: created with the content's poster
        let seasons = add_episode(&pool, id, "Season 2", "Episode 1", Some("https://cdn/s2e1.mp4"), Some("45m"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[1].name, "Season 2");
        assert_eq!(seasons[1].image.as_deref(), Some("https://cdn/series.jpg"));
        assert_eq!(seasons[1].episodes.len(), 1);
    }

    #[tokio::test]
    async fn test_add_episode_rejects_movies_and_unknown_ids() {
        let pool = test_pool().await;
        let id = create(&pool, movie("Heat")).await.unwrap();

        assert!(add_episode(&pool, id, "Season 1", "E1", None, None).await.unwrap().is_none());
        assert!(add_episode(&pool, 9999, "Season 1", "E1", None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_season_poster_update() {
        let pool = test_pool().await;
        let id = create(&pool, series("Dark")).await.unwrap();

        assert!(set_season_poster(&pool, id, "Season 1", "https://cdn/new.jpg").await.unwrap());
        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.seasons[0].image.as_deref(), Some("https://cdn/new.jpg"));

        assert!(!set_season_poster(&pool, id, "Season 9", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_episode() {
        let pool = test_pool().await;
        let id = create(&pool, series("Dark")).await.unwrap();
        add_episode(&pool, id, "Season 1", "Episode 2", None, None).await.unwrap();

        assert!(delete_episode(&pool, id, "Season 1", "Episode 2").await.unwrap());
        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.seasons[0].episodes.len(), 1);

        assert!(!delete_episode(&pool, id, "Season 1", "Episode 9").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_id() {
        let pool = test_pool().await;
        let a = create(&pool, movie("Heat")).await.unwrap();
        let b = create(&pool, series("Dark")).await.unwrap();

        assert!(delete(&pool, a).await.unwrap());
        assert!(get(&pool, a).await.unwrap().is_none());
        assert!(get(&pool, b).await.unwrap().is_some());
        assert!(!delete(&pool, a).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_views() {
        let pool = test_pool().await;
        let id = create(&pool, movie("Heat")).await.unwrap();

        assert_eq!(increment_views(&pool, id).await.unwrap(), Some(1));
        assert_eq!(increment_views(&pool, id).await.unwrap(), Some(2));
        assert_eq!(increment_views(&pool, 9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_top_by_views_ranking() {
        let pool = test_pool().await;
        let mut ids = Vec::new();
        for i in 0..7 {
            ids.push(create(&pool, movie(&format!("M{i}"))).await.unwrap());
        }
        // views: M0=0, M1=1, M2=2, ... M6=6
        for (i, id) in ids.iter().enumerate() {
            for _ in 0..i {
                increment_views(&pool, *id).await.unwrap();
            }
        }

        let top = top_by_views(&pool, 5).await.unwrap();
        assert_eq!(top.len(), 5);
        let views: Vec<i64> = top.iter().map(|i| i.views).collect();
        assert_eq!(views, vec![6, 5, 4, 3, 2]);
    }

    #[tokio::test]
    async fn test_top_by_views_tie_order_is_stable() {
        let pool = test_pool().await;
        let a = create(&pool, movie("A")).await.unwrap();
        let b = create(&pool, movie("B")).await.unwrap();

        let top = top_by_views(&pool, 5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, a);
        assert_eq!(top[1].id, b);
    }

    #[tokio::test]
    async fn test_update_patches_only_supplied_fields() {
        let pool = test_pool().await;
        let id = create(&pool, movie("Heat")).await.unwrap();

        let patched = update(
            &pool,
            id,
            ContentPatch {
                description: Some("A heist thriller".to_string()),
                rating: Some(9.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(patched);

        let dto = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(dto.title, "Heat"); // untouched
        assert_eq!(dto.description.as_deref(), Some("A heist thriller"));
        assert_eq!(dto.rating, Some(9.0));

        assert!(!update(&pool, 9999, ContentPatch::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_banner_crud() {
        let pool = test_pool().await;

        let id = create_banner(
            &pool,
            BannerFields {
                title: Some("Promo".to_string()),
                tag: Some("Trending".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(update_banner(
            &pool,
            id,
            BannerFields {
                tag: Some("Top 10".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap());

        let banners = list_banners(&pool).await.unwrap();
        assert_eq!(banners[0].title.as_deref(), Some("Promo"));
        assert_eq!(banners[0].tag.as_deref(), Some("Top 10"));

        assert!(delete_banner(&pool, id).await.unwrap());
        assert!(!delete_banner(&pool, id).await.unwrap());
    }
}
