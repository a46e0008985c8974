//! Stateless HTTP request builders and response parsers for the band API.
//!
//! # Design
//! `BandClient` and `GrammyClient` hold only a base URL and carry no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Bodies go through the XML codec in both directions.
//!
//! Any 2xx status is success. Every other status becomes an `ApiError`
//! carrying the message from the server's XML error envelope, or `HTTP <status>`
//! when the body has none.

use tracing::debug;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{BandRequest, BandSearchRequest, MusicBand, Page, PageRequest};
use crate::xml;

/// Client for the band catalog service.
#[derive(Debug, Clone)]
pub struct BandClient {
    base_url: String,
}

impl BandClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_get_band(&self, id: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/{id}", self.base_url))
    }

    pub fn build_create_band(&self, input: &BandRequest) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, self.base_url.clone())
            .with_xml_body(xml::band_request_to_xml(input))
    }

    pub fn build_update_band(&self, id: i64, input: &BandRequest) -> HttpRequest {
        HttpRequest::new(HttpMethod::Put, format!("{}/{id}", self.base_url))
            .with_xml_body(xml::band_request_to_xml(input))
    }

    pub fn build_delete_band(&self, id: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, format!("{}/{id}", self.base_url))
    }

    /// Paged list narrowed by `filter`. `filter.sort` goes to the query string.
    pub fn build_filter_bands(&self, filter: &BandSearchRequest, page: PageRequest) -> HttpRequest {
        let query = page_query(page, filter.sort.as_deref());
        HttpRequest::new(
            HttpMethod::Post,
            format!("{}/filters?{query}", self.base_url),
        )
        .with_xml_body(xml::search_request_to_xml(filter))
    }

    /// Unfiltered paged list; same endpoint as `build_filter_bands` with an
    /// empty criteria document.
    pub fn build_all_bands(&self, page: PageRequest) -> HttpRequest {
        self.build_filter_bands(&BandSearchRequest::default(), page)
    }

    pub fn build_search_by_name(&self, substring: &str, page: PageRequest) -> HttpRequest {
        let query = page_query(page, None);
        HttpRequest::new(
            HttpMethod::Post,
            format!("{}/search-by-name?{query}", self.base_url),
        )
        .with_xml_body(xml::substring_to_xml(substring))
    }

    pub fn build_count_equal_singles(&self, singles_count: i64) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            format!("{}/singles/equally/{singles_count}", self.base_url),
        )
    }

    pub fn build_count_greater_singles(&self, singles_count: i64) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            format!("{}/singles/greater/{singles_count}", self.base_url),
        )
    }

    pub fn parse_get_band(&self, response: HttpResponse) -> Result<MusicBand, ApiError> {
        check_status(&response)?;
        xml::parse_band(&response.body)
    }

    pub fn parse_create_band(&self, response: HttpResponse) -> Result<MusicBand, ApiError> {
        check_status(&response)?;
        xml::parse_band(&response.body)
    }

    pub fn parse_update_band(&self, response: HttpResponse) -> Result<MusicBand, ApiError> {
        check_status(&response)?;
        xml::parse_band(&response.body)
    }

    pub fn parse_delete_band(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Shared by the filtered, unfiltered and by-name list operations.
    pub fn parse_band_page(&self, response: HttpResponse) -> Result<Page<MusicBand>, ApiError> {
        check_status(&response)?;
        xml::parse_band_page(&response.body)
    }

    /// Shared by both singles-count operations.
    pub fn parse_count(&self, response: HttpResponse) -> Result<i64, ApiError> {
        check_status(&response)?;
        xml::parse_count(&response.body)
    }
}

/// Client for the Grammy service, which mutates bands on the catalog's behalf.
#[derive(Debug, Clone)]
pub struct GrammyClient {
    base_url: String,
}

impl GrammyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_add_single(&self, band_id: i64) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Post,
            format!("{}/band/{band_id}/singles/add", self.base_url),
        )
    }

    pub fn build_remove_participant(&self, band_id: i64) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Delete,
            format!("{}/band/{band_id}/participants/remove", self.base_url),
        )
    }

    pub fn parse_add_single(&self, response: HttpResponse) -> Result<MusicBand, ApiError> {
        check_status(&response)?;
        xml::parse_band(&response.body)
    }

    pub fn parse_remove_participant(&self, response: HttpResponse) -> Result<MusicBand, ApiError> {
        check_status(&response)?;
        xml::parse_band(&response.body)
    }
}

fn page_query(page: PageRequest, sort: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("page", &page.page.to_string());
    query.append_pair("size", &page.size.to_string());
    if let Some(sort) = sort.filter(|s| !s.is_empty()) {
        query.append_pair("sort", sort);
    }
    query.finish()
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = response
        .is_xml()
        .then(|| xml::extract_error_message(&response.body))
        .flatten()
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    debug!(status = response.status, %message, "request failed");
    if response.status == 404 {
        return Err(ApiError::NotFound { message });
    }
    Err(ApiError::Http {
        status: response.status,
        message,
    })
}
