//! Domain values for the band catalog.
//!
//! # Design
//! Field names follow the remote API's XML tags (camelCase under serde) so the
//! same types can be loaded from JSON test vectors or handed to a
//! presentation layer without a second mapping. Bands are only ever built by
//! the XML codec from server responses; `BandRequest` is the draft a form
//! edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Closed set of genres the API knows about.
///
/// Unknown tags are not an error: they decode to the default (`HIP_HOP`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MusicGenre {
    ProgressiveRock,
    #[default]
    HipHop,
    PunkRock,
}

impl MusicGenre {
    /// Lenient decode of a wire tag.
    pub fn from_tag(tag: &str) -> Self {
        tag.trim().parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub sales: i64,
}

/// A band as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicBand {
    pub id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    pub creation_date: DateTime<Utc>,
    pub number_of_participants: i64,
    pub singles_count: i64,
    pub albums_count: i64,
    pub genre: MusicGenre,
    #[serde(default)]
    pub label: Option<Label>,
}

/// Payload for create and update. Carries no id or creation date; the server
/// owns both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandRequest {
    pub name: String,
    pub coordinates: Coordinates,
    pub number_of_participants: i64,
    pub albums_count: i64,
    pub singles_count: i64,
    pub music_genre: MusicGenre,
    #[serde(default)]
    pub label: Option<Label>,
}

impl From<&MusicBand> for BandRequest {
    fn from(band: &MusicBand) -> Self {
        Self {
            name: band.name.clone(),
            coordinates: band.coordinates,
            number_of_participants: band.number_of_participants,
            albums_count: band.albums_count,
            singles_count: band.singles_count,
            music_genre: band.genre,
            label: band.label.clone(),
        }
    }
}

/// Filter criteria for the paged list endpoint. Every field is optional.
///
/// `sort` has the form `"<field>,<asc|desc>"` and travels in the query
/// string, not in the XML body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandSearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<MusicGenre>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_participants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singles_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub albums_count: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub size: i64,
}

/// One page of a list response. Pagination is present even when `items` is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// 1-based page selector for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}
