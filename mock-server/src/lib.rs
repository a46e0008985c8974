//! In-memory stand-in for the band catalog and Grammy services.
//!
//! Speaks the same XML wire format as the real services: `/bands/...` for
//! the catalog and `/grammy/...` for the Grammy actions. Request and response
//! shapes are defined here independently of `band-core`, so the client's
//! integration tests catch schema drift.

use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, error, info};

pub const GENRES: [&str; 3] = ["PROGRESSIVE_ROCK", "HIP_HOP", "PUNK_ROCK"];
pub const MAX_PARTICIPANTS: i64 = 100;
pub const MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub sales: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    pub creation_date: String,
    pub number_of_participants: i64,
    pub singles_count: i64,
    pub albums_count: i64,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LabelInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sales: Option<i64>,
}

/// `<bandRequest>` body of create and update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandInput {
    #[serde(default)]
    pub name: String,
    pub coordinates: Coordinates,
    pub number_of_participants: i64,
    pub albums_count: i64,
    pub singles_count: i64,
    pub music_genre: String,
    #[serde(default)]
    pub label: Option<LabelInput>,
}

/// `<bandSearchRequest>` body of the filter endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub number_of_participants: Option<i64>,
    #[serde(default)]
    pub singles_count: Option<i64>,
    #[serde(default)]
    pub albums_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubstringInput {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOut {
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u32,
    pub size: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BandList {
    #[serde(default)]
    pub band: Vec<Band>,
}

/// `<response>` envelope of the paged endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct BandPage {
    pub pagination: PaginationOut,
    pub bands: BandList,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Count {
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDesc {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    bands: BTreeMap<i64, Band>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/bands", post(create_band))
        .route(
            "/bands/{id}",
            get(get_band).put(update_band).delete(delete_band),
        )
        .route("/bands/filters", post(filter_bands))
        .route("/bands/search-by-name", post(search_by_name))
        .route("/bands/singles/equally/{count}", get(count_equal_singles))
        .route("/bands/singles/greater/{count}", get(count_greater_singles))
        .route("/grammy/band/{id}/singles/add", post(add_single))
        .route(
            "/grammy/band/{id}/participants/remove",
            delete(remove_participant),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Errors and XML plumbing
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ServerError {
    /// 404 with an empty body, like the catalog's GET and DELETE.
    Missing,
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ServerError::Missing => return StatusCode::NOT_FOUND.into_response(),
            ServerError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
            ServerError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
        };
        debug!(%status, %message, "rejecting request");
        xml_response(
            status,
            "errorDesc",
            &ErrorDesc {
                error: code.to_string(),
                message,
            },
        )
    }
}

fn xml_response<T: Serialize>(status: StatusCode, root: &str, value: &T) -> Response {
    match quick_xml::se::to_string_with_root(root, value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response(),
        Err(err) => {
            error!(%err, "failed to encode response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ServerError> {
    quick_xml::de::from_str(body)
        .map_err(|err| ServerError::BadRequest(format!("malformed XML body: {err}")))
}

fn band_not_found(id: i64) -> ServerError {
    ServerError::NotFound(format!("Band with band-id {id} not found"))
}

fn now() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct ValidBand {
    name: String,
    coordinates: Coordinates,
    number_of_participants: i64,
    albums_count: i64,
    singles_count: i64,
    genre: String,
    label: Option<Label>,
}

fn validate_band(input: BandInput) -> Result<ValidBand, ServerError> {
    if input.name.trim().is_empty() {
        return Err(ServerError::BadRequest("name must not be blank".to_string()));
    }
    if !GENRES.contains(&input.music_genre.as_str()) {
        return Err(ServerError::BadRequest(format!(
            "unknown genre {}",
            input.music_genre
        )));
    }
    if !(1..=MAX_PARTICIPANTS).contains(&input.number_of_participants) {
        return Err(ServerError::BadRequest(format!(
            "numberOfParticipants must be between 1 and {MAX_PARTICIPANTS}"
        )));
    }
    if input.albums_count < 0 || input.singles_count < 0 {
        return Err(ServerError::BadRequest(
            "counts must not be negative".to_string(),
        ));
    }
    let label = input.label.and_then(|l| match (l.name, l.sales) {
        (None, None) => None,
        (name, sales) => Some(Label {
            name: name.unwrap_or_default(),
            sales: sales.unwrap_or_default(),
        }),
    });
    Ok(ValidBand {
        name: input.name,
        coordinates: input.coordinates,
        number_of_participants: input.number_of_participants,
        albums_count: input.albums_count,
        singles_count: input.singles_count,
        genre: input.music_genre,
        label,
    })
}

fn page_of(bands: Vec<Band>, params: &PageParams) -> Result<BandPage, ServerError> {
    let page = params.page.unwrap_or(1);
    let size = params.size.unwrap_or(10);
    if page < 1 {
        return Err(ServerError::BadRequest("page must be at least 1".to_string()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(ServerError::BadRequest(format!(
            "size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let total_count = bands.len() as u32;
    let total_pages = total_count.div_ceil(size);
    let band = bands
        .into_iter()
        .skip(((page - 1) as usize).saturating_mul(size as usize))
        .take(size as usize)
        .collect();
    Ok(BandPage {
        pagination: PaginationOut {
            page,
            total_pages,
            total_count,
            size,
        },
        bands: BandList { band },
    })
}

/// Sort by `"<field>,<asc|desc>"`; direction defaults to ascending.
fn sort_bands(bands: &mut [Band], sort: &str) -> Result<(), ServerError> {
    let mut parts = sort.split(',').map(str::trim);
    let field = parts.next().unwrap_or_default();
    let descending = match parts.next() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            return Err(ServerError::BadRequest(format!(
                "invalid sort direction {other}"
            )))
        }
    };
    let compare: fn(&Band, &Band) -> Ordering = match field {
        "id" => |a: &Band, b: &Band| a.id.cmp(&b.id),
        "name" => |a: &Band, b: &Band| a.name.cmp(&b.name),
        "creationDate" => |a: &Band, b: &Band| a.creation_date.cmp(&b.creation_date),
        "numberOfParticipants" => |a: &Band, b: &Band| a.number_of_participants.cmp(&b.number_of_participants),
        "singlesCount" => |a: &Band, b: &Band| a.singles_count.cmp(&b.singles_count),
        "albumsCount" => |a: &Band, b: &Band| a.albums_count.cmp(&b.albums_count),
        "genre" => |a: &Band, b: &Band| a.genre.cmp(&b.genre),
        other => {
            return Err(ServerError::BadRequest(format!(
                "unknown sort field {other}"
            )))
        }
    };
    bands.sort_by(|a, b| {
        let ord = compare(a, b);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    Ok(())
}

fn matches_filter(band: &Band, filter: &SearchInput) -> bool {
    filter
        .name
        .as_deref()
        .map_or(true, |n| band.name.to_lowercase().contains(&n.to_lowercase()))
        && filter.genre.as_deref().map_or(true, |g| band.genre == g)
        && filter
            .number_of_participants
            .map_or(true, |n| band.number_of_participants == n)
        && filter.singles_count.map_or(true, |n| band.singles_count == n)
        && filter.albums_count.map_or(true, |n| band.albums_count == n)
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

async fn create_band(State(db): State<Db>, body: String) -> Result<Response, ServerError> {
    let input = validate_band(parse_body(&body)?)?;
    let mut store = db.write().await;
    store.next_id += 1;
    let band = Band {
        id: store.next_id,
        name: input.name,
        coordinates: input.coordinates,
        creation_date: now(),
        number_of_participants: input.number_of_participants,
        singles_count: input.singles_count,
        albums_count: input.albums_count,
        genre: input.genre,
        label: input.label,
    };
    store.bands.insert(band.id, band.clone());
    info!(id = band.id, name = %band.name, "band created");
    Ok(xml_response(StatusCode::CREATED, "musicBand", &band))
}

async fn get_band(State(db): State<Db>, Path(id): Path<i64>) -> Result<Response, ServerError> {
    let store = db.read().await;
    let band = store.bands.get(&id).ok_or(ServerError::Missing)?;
    Ok(xml_response(StatusCode::OK, "musicBand", band))
}

async fn update_band(
    State(db): State<Db>,
    Path(id): Path<i64>,
    body: String,
) -> Result<Response, ServerError> {
    let input = validate_band(parse_body(&body)?)?;
    let mut store = db.write().await;
    let band = store.bands.get_mut(&id).ok_or_else(|| band_not_found(id))?;
    band.name = input.name;
    band.coordinates = input.coordinates;
    band.number_of_participants = input.number_of_participants;
    band.singles_count = input.singles_count;
    band.albums_count = input.albums_count;
    band.genre = input.genre;
    band.label = input.label;
    info!(id, "band updated");
    Ok(xml_response(StatusCode::OK, "musicBand", &*band))
}

async fn delete_band(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, ServerError> {
    let mut store = db.write().await;
    store.bands.remove(&id).ok_or(ServerError::Missing)?;
    info!(id, "band deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn filter_bands(
    State(db): State<Db>,
    Query(params): Query<PageParams>,
    body: String,
) -> Result<Response, ServerError> {
    let filter: SearchInput = if body.trim().is_empty() {
        SearchInput::default()
    } else {
        parse_body(&body)?
    };
    if filter
        .number_of_participants
        .is_some_and(|n| n > MAX_PARTICIPANTS)
    {
        return Err(ServerError::BadRequest(format!(
            "numberOfParticipants filter exceeds {MAX_PARTICIPANTS}"
        )));
    }
    let mut bands: Vec<Band> = db
        .read()
        .await
        .bands
        .values()
        .filter(|b| matches_filter(b, &filter))
        .cloned()
        .collect();
    if let Some(sort) = params.sort.as_deref().filter(|s| !s.is_empty()) {
        sort_bands(&mut bands, sort)?;
    }
    let page = page_of(bands, &params)?;
    Ok(xml_response(StatusCode::OK, "response", &page))
}

async fn search_by_name(
    State(db): State<Db>,
    Query(params): Query<PageParams>,
    body: String,
) -> Result<Response, ServerError> {
    let input: SubstringInput = parse_body(&body)?;
    let bands: Vec<Band> = db
        .read()
        .await
        .bands
        .values()
        .filter(|b| b.name.contains(&input.value))
        .cloned()
        .collect();
    let page = page_of(bands, &params)?;
    Ok(xml_response(StatusCode::OK, "response", &page))
}

async fn count_equal_singles(State(db): State<Db>, Path(count): Path<i64>) -> Response {
    let value = db
        .read()
        .await
        .bands
        .values()
        .filter(|b| b.singles_count == count)
        .count() as i64;
    xml_response(StatusCode::OK, "count", &Count { value })
}

async fn count_greater_singles(State(db): State<Db>, Path(count): Path<i64>) -> Response {
    let value = db
        .read()
        .await
        .bands
        .values()
        .filter(|b| b.singles_count > count)
        .count() as i64;
    xml_response(StatusCode::OK, "count", &Count { value })
}

// ---------------------------------------------------------------------------
// Grammy handlers
// ---------------------------------------------------------------------------

async fn add_single(State(db): State<Db>, Path(id): Path<i64>) -> Result<Response, ServerError> {
    let mut store = db.write().await;
    let band = store.bands.get_mut(&id).ok_or_else(|| band_not_found(id))?;
    band.singles_count += 1;
    info!(id, singles = band.singles_count, "single added");
    Ok(xml_response(StatusCode::OK, "musicBand", &*band))
}

async fn remove_participant(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Response, ServerError> {
    let mut store = db.write().await;
    let band = store.bands.get_mut(&id).ok_or_else(|| band_not_found(id))?;
    if band.number_of_participants <= 1 {
        return Err(ServerError::BadRequest(format!(
            "Band with band-id {id} must keep at least one participant"
        )));
    }
    band.number_of_participants -= 1;
    info!(id, participants = band.number_of_participants, "participant removed");
    Ok(xml_response(StatusCode::OK, "musicBand", &*band))
}
