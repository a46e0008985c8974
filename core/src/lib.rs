//! Data layer for the music band catalog console.
//!
//! # Overview
//! Talks XML over HTTP to the band catalog service and the Grammy service,
//! and keeps the latest results in observable view-models that a
//! presentation layer subscribes to.
//!
//! # Design
//! - `BandClient` / `GrammyClient` are stateless: each operation is split
//!   into `build_*` (produces an `HttpRequest`) and `parse_*` (consumes an
//!   `HttpResponse`), so the I/O boundary is explicit.
//! - `Transport` performs the round trip; `ReqwestTransport` is the network
//!   implementation.
//! - `xml` holds the lenient decoders and escaping encoders.
//! - `BandViewModel` / `GrammyViewModel` run the loading/error protocol and
//!   notify subscribers on every state transition. They are single-threaded
//!   and constructed explicitly; share them by reference.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod input;
pub mod observer;
pub mod transport;
pub mod types;
pub mod view_model;
pub mod xml;

pub use client::{BandClient, GrammyClient};
pub use config::ApiConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use input::{parse_band_id, parse_singles_threshold};
pub use observer::{Listeners, Subscription};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    BandRequest, BandSearchRequest, Coordinates, Label, MusicBand, MusicGenre, Page, PageRequest,
    Pagination,
};
pub use view_model::{BandViewModel, GrammyViewModel, ViewState};
