use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

/// Content summary carried on a user's watchlist / continue-watching list.
/// Clients send the full catalog item; only the fields the rows render are kept.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WatchItem {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// A row of the single tagged content table. `category` discriminates
/// movie / series / anime; `genres` holds a JSON array as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub video_url: Option<String>,
    pub trailer_url: Option<String>,
    pub category: String,
    pub year: Option<String>,
    pub cast_list: Option<String>,
    pub genres: String,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeasonRow {
    pub id: i64,
    pub content_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Banner {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    pub category: Option<String>,
    #[serde(skip_serializing)]
    pub created_at: String,
}

/// Wire shape of a catalog item, seasons nested (always empty for movies).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDto {
    pub id: i64,
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
    pub views: i64,
    pub seasons: Vec<SeasonDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonDto {
    pub name: String,
    pub image: Option<String>,
    pub episodes: Vec<EpisodeDto>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EpisodeDto {
    pub title: String,
    pub url: Option<String>,
    pub duration: Option<String>,
}

impl ContentDto {
    pub fn from_row(row: ContentRow, seasons: Vec<SeasonDto>) -> Self {
        let genres: Vec<String> = serde_json::from_str(&row.genres).unwrap_or_default();
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            rating: row.rating,
            image: row.image,
            video_url: row.video_url,
            trailer_url: row.trailer_url,
            category: row.category,
            year: row.year,
            cast: row.cast_list,
            genres,
            views: row.views,
            seasons,
        }
    }
}
