// Admin console endpoints.
//
// Every mutating route exists in two variants: a server-proxied multipart
// one (binary payloads are bridged to the media host before the metadata
// write) and a "-direct" JSON one that accepts pre-uploaded URLs. The direct
// variants are the preferred design: the API's request latency stays
// independent of payload size. The multipart variants run under a 2-minute
// timeout for slow links.
//
// Input follows the admin console's loose conventions: rating may arrive as
// a number or numeric string, genres as an array or a JSON-encoded string
// (malformed input degrades to an empty list), featured as a bool or "true".

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::api::error::ApiError;
use crate::models::ContentDto;
use crate::services::content::{BannerFields, ContentPatch, NewContent};
use crate::services::mediahost::ResourceKind;
use crate::{services, AppState};

/// Server-proxied uploads accept large video payloads
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add", post(add_content_upload))
        .route("/add-direct", post(add_content_direct))
        .route("/update/:id", put(update_content_upload))
        .route("/update-direct/:id", put(update_content_direct))
        .route("/delete/:id", delete(delete_content))
        .route("/add-episode", post(add_episode_upload))
        .route("/add-episode-direct", post(add_episode_direct))
        .route("/delete-episode", post(delete_episode))
        .route("/update-season-poster", post(update_season_poster_upload))
        .route("/update-season-poster-direct", post(update_season_poster_direct))
        .route("/carousel/add", post(add_banner_upload))
        .route("/carousel/add-direct", post(add_banner_direct))
        .route("/carousel/update/:id", put(update_banner_upload))
        .route("/carousel/update-direct/:id", put(update_banner_direct))
        .route("/carousel/delete/:id", delete(delete_banner))
        .route("/analytics", get(analytics))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
}

// ============================================================================
// Multipart plumbing
// ============================================================================

/// A parsed multipart form: text fields by name, file parts by field name
/// (the console sends at most one file per field)
#[derive(Default)]
struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, (String, Vec<u8>)>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
                .to_vec();
            form.files.insert(name, (file_name, bytes));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Bridge one file part to the media host; None when the field was not sent
async fn upload_field(
    state: &AppState,
    form: &mut UploadForm,
    field: &str,
) -> Result<Option<String>, ApiError> {
    let Some((file_name, bytes)) = form.files.remove(field) else {
        return Ok(None);
    };

    let url = state
        .media
        .upload(ResourceKind::for_field(field), &file_name, bytes)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Some(url))
}

// ============================================================================
// Input coercion
// ============================================================================

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn coerce_rating(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn coerce_genres(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_str().map(String::from))
            .collect(),
        // JSON-encoded string, e.g. "[\"Action\"]"; malformed input -> []
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn coerce_count(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn content_patch_from(value: &Value) -> ContentPatch {
    ContentPatch {
        title: str_field(value, "title"),
        description: str_field(value, "description"),
        rating: coerce_rating(value.get("rating")),
        image: str_field(value, "image"),
        video_url: str_field(value, "videoUrl"),
        trailer_url: str_field(value, "trailerUrl"),
        category: str_field(value, "category"),
        year: str_field(value, "year"),
        cast: str_field(value, "cast"),
        genres: value.get("genres").map(|g| coerce_genres(Some(g))),
        views: coerce_count(value.get("views")),
    }
}

fn banner_fields_from(value: &Value) -> BannerFields {
    BannerFields {
        title: str_field(value, "title"),
        description: str_field(value, "description"),
        image: str_field(value, "image"),
        tag: str_field(value, "tag"),
        video_url: str_field(value, "videoUrl"),
        category: str_field(value, "category"),
    }
}

/// Multipart text fields reinterpreted as the JSON shape the direct routes take
fn fields_to_value(fields: &HashMap<String, String>) -> Value {
    let mut map = serde_json::Map::new();
    for (k, v) in fields {
        map.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(map)
}

// ============================================================================
// Content
// ============================================================================

fn new_content_from(value: &Value) -> NewContent {
    NewContent {
        title: str_field(value, "title").unwrap_or_default(),
        description: str_field(value, "description"),
        rating: coerce_rating(value.get("rating")),
        image: str_field(value, "image"),
        video_url: str_field(value, "videoUrl"),
        trailer_url: str_field(value, "trailerUrl"),
        category: str_field(value, "category").unwrap_or_else(|| "movie".to_string()),
        year: str_field(value, "year"),
        cast: str_field(value, "cast"),
        genres: coerce_genres(value.get("genres")),
        featured: coerce_flag(value.get("featured")),
    }
}

/// POST /api/admin/add (multipart)
async fn add_content_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = read_multipart(multipart).await?;

    let image = upload_field(&state, &mut form, "imageFile").await?;
    let video = upload_field(&state, &mut form, "videoFile").await?;
    let trailer = upload_field(&state, &mut form, "trailerFile").await?;

    let mut new = new_content_from(&fields_to_value(&form.fields));
    new.image = image.or(new.image);
    new.video_url = video.or(new.video_url);
    new.trailer_url = trailer.or(new.trailer_url);

    let id = services::content::create(&state.db, new).await?;
    Ok(Json(json!({ "message": "Upload Successful!", "id": id })))
}

/// POST /api/admin/add-direct (JSON, pre-uploaded URLs)
async fn add_content_direct(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let new = new_content_from(&body);
    let id = services::content::create(&state.db, new).await?;
    Ok(Json(json!({ "message": "Saved Successfully!", "id": id })))
}

/// PUT /api/admin/update/:id (multipart, optional imageFile)
async fn update_content_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = read_multipart(multipart).await?;
    let image = upload_field(&state, &mut form, "imageFile").await?;

    let mut patch = content_patch_from(&fields_to_value(&form.fields));
    patch.image = image.or(patch.image);

    if !services::content::update(&state.db, id, patch).await? {
        return Err(ApiError::not_found("Content"));
    }

    let item = services::content::get(&state.db, id).await?;
    Ok(Json(json!({ "message": "Updated Successfully!", "item": item })))
}

/// PUT /api/admin/update-direct/:id
async fn update_content_direct(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let patch = content_patch_from(&body);
    if !services::content::update(&state.db, id, patch).await? {
        return Err(ApiError::not_found("Content"));
    }

    let item = services::content::get(&state.db, id).await?;
    Ok(Json(json!({ "message": "Updated Successfully!", "item": item })))
}

/// DELETE /api/admin/delete/:id
async fn delete_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if !services::content::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Content"));
    }
    Ok(Json(json!({ "message": "Deleted" })))
}

// ============================================================================
// Seasons and episodes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeRequest {
    content_id: i64,
    season_name: String,
    title: String,
    url: Option<String>,
    duration: Option<String>,
}

fn parse_content_id(fields: &HashMap<String, String>) -> Result<i64, ApiError> {
    fields
        .get("contentId")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing or invalid contentId".to_string()))
}

/// POST /api/admin/add-episode (multipart videoFile)
async fn add_episode_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = read_multipart(multipart).await?;
    let url = upload_field(&state, &mut form, "videoFile").await?;

    let content_id = parse_content_id(&form.fields)?;
    let season_name = form.fields.get("seasonName").cloned().unwrap_or_default();
    let title = form.fields.get("title").cloned().unwrap_or_default();
    let duration = form.fields.get("duration").cloned();

    append_episode(&state, content_id, &season_name, &title, url.as_deref(), duration.as_deref())
        .await
}

/// POST /api/admin/add-episode-direct
async fn add_episode_direct(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EpisodeRequest>,
) -> Result<Json<Value>, ApiError> {
    append_episode(
        &state,
        req.content_id,
        &req.season_name,
        &req.title,
        req.url.as_deref(),
        req.duration.as_deref(),
    )
    .await
}

async fn append_episode(
    state: &AppState,
    content_id: i64,
    season_name: &str,
    title: &str,
    url: Option<&str>,
    duration: Option<&str>,
) -> Result<Json<Value>, ApiError> {
    let seasons =
        services::content::add_episode(&state.db, content_id, season_name, title, url, duration)
            .await?
            .ok_or_else(|| ApiError::not_found("Content"))?;
    Ok(Json(json!({ "message": "Episode Added!", "seasons": seasons })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteEpisodeRequest {
    content_id: i64,
    season_name: String,
    title: String,
}

/// POST /api/admin/delete-episode
async fn delete_episode(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteEpisodeRequest>,
) -> Result<Json<Value>, ApiError> {
    let removed =
        services::content::delete_episode(&state.db, req.content_id, &req.season_name, &req.title)
            .await?;
    if !removed {
        return Err(ApiError::not_found("Episode"));
    }

    let seasons = services::content::seasons_for(&state.db, req.content_id).await?;
    Ok(Json(json!({ "message": "Episode Deleted!", "seasons": seasons })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeasonPosterRequest {
    content_id: i64,
    season_name: String,
    image: String,
}

/// POST /api/admin/update-season-poster (multipart seasonImageFile)
async fn update_season_poster_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = read_multipart(multipart).await?;
    let image = upload_field(&state, &mut form, "seasonImageFile")
        .await?
        .ok_or_else(|| ApiError::BadRequest("Missing seasonImageFile".to_string()))?;

    let content_id = parse_content_id(&form.fields)?;
    let season_name = form.fields.get("seasonName").cloned().unwrap_or_default();

    set_season_poster(&state, content_id, &season_name, &image).await
}

/// POST /api/admin/update-season-poster-direct
async fn update_season_poster_direct(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeasonPosterRequest>,
) -> Result<Json<Value>, ApiError> {
    set_season_poster(&state, req.content_id, &req.season_name, &req.image).await
}

async fn set_season_poster(
    state: &AppState,
    content_id: i64,
    season_name: &str,
    image: &str,
) -> Result<Json<Value>, ApiError> {
    if !services::content::set_season_poster(&state.db, content_id, season_name, image).await? {
        return Err(ApiError::not_found("Season"));
    }
    Ok(Json(json!({ "message": "Poster Updated!" })))
}

// ============================================================================
// Banners
// ============================================================================

/// POST /api/admin/carousel/add (multipart)
async fn add_banner_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = read_multipart(multipart).await?;
    let image = upload_field(&state, &mut form, "imageFile").await?;
    let video = upload_field(&state, &mut form, "videoFile").await?;

    let mut fields = banner_fields_from(&fields_to_value(&form.fields));
    fields.image = image.or(fields.image);
    fields.video_url = video.or(fields.video_url);

    let id = services::content::create_banner(&state.db, fields).await?;
    Ok(Json(json!({ "message": "Banner Added!", "id": id })))
}

/// POST /api/admin/carousel/add-direct
async fn add_banner_direct(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let fields = banner_fields_from(&body);
    let id = services::content::create_banner(&state.db, fields).await?;
    Ok(Json(json!({ "message": "Banner Saved!", "id": id })))
}

/// PUT /api/admin/carousel/update/:id (multipart)
async fn update_banner_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = read_multipart(multipart).await?;
    let image = upload_field(&state, &mut form, "imageFile").await?;
    let video = upload_field(&state, &mut form, "videoFile").await?;

    let mut fields = banner_fields_from(&fields_to_value(&form.fields));
    fields.image = image.or(fields.image);
    fields.video_url = video.or(fields.video_url);

    if !services::content::update_banner(&state.db, id, fields).await? {
        return Err(ApiError::not_found("Banner"));
    }
    Ok(Json(json!({ "message": "Banner Updated!" })))
}

/// PUT /api/admin/carousel/update-direct/:id
async fn update_banner_direct(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let fields = banner_fields_from(&body);
    if !services::content::update_banner(&state.db, id, fields).await? {
        return Err(ApiError::not_found("Banner"));
    }
    Ok(Json(json!({ "message": "Banner Updated!" })))
}

/// DELETE /api/admin/carousel/delete/:id
async fn delete_banner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if !services::content::delete_banner(&state.db, id).await? {
        return Err(ApiError::not_found("Banner"));
    }
    Ok(Json(json!({ "message": "Deleted" })))
}

// ============================================================================
// Analytics
// ============================================================================

/// GET /api/admin/analytics
/// Point-in-time top 5 by views across every category
async fn analytics(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ContentDto>>, ApiError> {
    Ok(Json(services::content::top_by_views(&state.db, 5).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_rating() {
        assert_eq!(coerce_rating(Some(&json!(8.5))), Some(8.5));
        assert_eq!(coerce_rating(Some(&json!("8.5"))), Some(8.5));
        assert_eq!(coerce_rating(Some(&json!("n/a"))), None);
        assert_eq!(coerce_rating(None), None);
    }

    #[test]
    fn test_coerce_genres() {
        assert_eq!(
            coerce_genres(Some(&json!(["Action", "Drama"]))),
            vec!["Action", "Drama"]
        );
        assert_eq!(
            coerce_genres(Some(&json!("[\"Action\"]"))),
            vec!["Action"]
        );
        // Malformed JSON string degrades to an empty list
        assert!(coerce_genres(Some(&json!("not json"))).is_empty());
        assert!(coerce_genres(None).is_empty());
    }

    #[test]
    fn test_coerce_flag() {
        assert!(coerce_flag(Some(&json!(true))));
        assert!(coerce_flag(Some(&json!("true"))));
        assert!(!coerce_flag(Some(&json!("false"))));
        assert!(!coerce_flag(Some(&json!(false))));
        assert!(!coerce_flag(None));
    }

    #[test]
    fn test_new_content_trailer_left_empty_for_service_fallback() {
        let new = new_content_from(&json!({
            "title": "Heat",
            "category": "movie",
            "videoUrl": "https://cdn/v.mp4",
            "rating": "8.3"
        }));
        assert_eq!(new.title, "Heat");
        assert_eq!(new.rating, Some(8.3));
        assert!(new.trailer_url.is_none());
        assert!(!new.featured);
    }
}
