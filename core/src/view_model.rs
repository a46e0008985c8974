//! Observable state holders between the API clients and a presentation layer.
//!
//! # Design
//! A view-model owns a client, a transport and a snapshot of what the UI
//! currently shows. Every operation follows the same two-step protocol:
//!
//! 1. `loading = true`, `error = None`, notify.
//! 2. On success update the cached data, `loading = false`, notify. On
//!    failure `error = Some(message)`, `loading = false`, notify, and hand
//!    the error back to the caller.
//!
//! Methods take `&self` and keep state in `RefCell`s that are never borrowed
//! across an `.await`, so several operations may be in flight on one thread.
//! There is no sequence guard: whichever finishes last wins.

use std::cell::RefCell;
use std::future::Future;

use tracing::{debug, warn};

use crate::client::{BandClient, GrammyClient};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::observer::{Listeners, Subscription};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{BandRequest, BandSearchRequest, MusicBand, Page, PageRequest, Pagination};

/// Status shared by every view-model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Status {
    state: RefCell<ViewState>,
    listeners: Listeners<ViewState>,
}

impl Status {
    fn begin(&self, operation: &'static str) {
        {
            let mut state = self.state.borrow_mut();
            state.loading = true;
            state.error = None;
        }
        debug!(operation, "operation started");
        self.notify();
    }

    fn finish(&self, operation: &'static str, error: Option<&ApiError>) {
        {
            let mut state = self.state.borrow_mut();
            state.loading = false;
            state.error = error.map(ToString::to_string);
        }
        match error {
            Some(err) => warn!(operation, error = %err, "operation failed"),
            None => debug!(operation, "operation finished"),
        }
        self.notify();
    }

    async fn run<R>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<R, ApiError>>,
    ) -> Result<R, ApiError> {
        self.begin(operation);
        let result = work.await;
        self.finish(operation, result.as_ref().err());
        result
    }

    fn clear_error(&self) {
        self.state.borrow_mut().error = None;
        self.notify();
    }

    fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        self.listeners.notify(&snapshot);
    }
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

/// State holder for the band catalog: the current page, its pagination, and
/// the band last opened for viewing or editing.
#[derive(Debug)]
pub struct BandViewModel<T> {
    client: BandClient,
    transport: T,
    status: Status,
    bands: RefCell<Vec<MusicBand>>,
    current_band: RefCell<Option<MusicBand>>,
    pagination: RefCell<Option<Pagination>>,
}

impl BandViewModel<ReqwestTransport> {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(BandClient::new(&config.bands_base_url), ReqwestTransport::new())
    }
}

impl<T: Transport> BandViewModel<T> {
    pub fn new(client: BandClient, transport: T) -> Self {
        Self {
            client,
            transport,
            status: Status::default(),
            bands: RefCell::new(Vec::new()),
            current_band: RefCell::new(None),
            pagination: RefCell::new(None),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&ViewState) + 'static) -> Subscription<ViewState> {
        self.status.listeners.subscribe(listener)
    }

    pub fn state(&self) -> ViewState {
        self.status.snapshot()
    }

    pub fn bands(&self) -> Vec<MusicBand> {
        self.bands.borrow().clone()
    }

    pub fn current_band(&self) -> Option<MusicBand> {
        self.current_band.borrow().clone()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        *self.pagination.borrow()
    }

    pub async fn get_band(&self, id: i64) -> Result<MusicBand, ApiError> {
        self.status
            .run("get_band", async {
                let response = self.transport.execute(self.client.build_get_band(id)).await?;
                let band = self.client.parse_get_band(response)?;
                *self.current_band.borrow_mut() = Some(band.clone());
                Ok(band)
            })
            .await
    }

    /// Create a band and prepend it to the cached page. Pagination is left
    /// as last loaded.
    pub async fn create_band(&self, input: &BandRequest) -> Result<MusicBand, ApiError> {
        self.status
            .run("create_band", async {
                let response = self
                    .transport
                    .execute(self.client.build_create_band(input))
                    .await?;
                let band = self.client.parse_create_band(response)?;
                self.bands.borrow_mut().insert(0, band.clone());
                *self.current_band.borrow_mut() = Some(band.clone());
                Ok(band)
            })
            .await
    }

    pub async fn update_band(&self, id: i64, input: &BandRequest) -> Result<MusicBand, ApiError> {
        self.status
            .run("update_band", async {
                let response = self
                    .transport
                    .execute(self.client.build_update_band(id, input))
                    .await?;
                let band = self.client.parse_update_band(response)?;
                for cached in self.bands.borrow_mut().iter_mut().filter(|b| b.id == id) {
                    *cached = band.clone();
                }
                *self.current_band.borrow_mut() = Some(band.clone());
                Ok(band)
            })
            .await
    }

    pub async fn delete_band(&self, id: i64) -> Result<(), ApiError> {
        self.status
            .run("delete_band", async {
                let response = self.transport.execute(self.client.build_delete_band(id)).await?;
                self.client.parse_delete_band(response)?;
                self.bands.borrow_mut().retain(|b| b.id != id);
                let mut current = self.current_band.borrow_mut();
                if current.as_ref().is_some_and(|b| b.id == id) {
                    *current = None;
                }
                Ok(())
            })
            .await
    }

    pub async fn load_all_bands(&self, page: PageRequest) -> Result<(), ApiError> {
        self.status
            .run("load_all_bands", async {
                let response = self.transport.execute(self.client.build_all_bands(page)).await?;
                self.replace_page(self.client.parse_band_page(response)?);
                Ok(())
            })
            .await
    }

    pub async fn load_bands_with_filters(
        &self,
        filter: &BandSearchRequest,
        page: PageRequest,
    ) -> Result<(), ApiError> {
        self.status
            .run("load_bands_with_filters", async {
                let response = self
                    .transport
                    .execute(self.client.build_filter_bands(filter, page))
                    .await?;
                self.replace_page(self.client.parse_band_page(response)?);
                Ok(())
            })
            .await
    }

    pub async fn search_bands_by_name(
        &self,
        substring: &str,
        page: PageRequest,
    ) -> Result<(), ApiError> {
        self.status
            .run("search_bands_by_name", async {
                let response = self
                    .transport
                    .execute(self.client.build_search_by_name(substring, page))
                    .await?;
                self.replace_page(self.client.parse_band_page(response)?);
                Ok(())
            })
            .await
    }

    pub async fn count_equal_singles(&self, singles_count: i64) -> Result<i64, ApiError> {
        self.status
            .run("count_equal_singles", async {
                let response = self
                    .transport
                    .execute(self.client.build_count_equal_singles(singles_count))
                    .await?;
                self.client.parse_count(response)
            })
            .await
    }

    pub async fn count_greater_singles(&self, singles_count: i64) -> Result<i64, ApiError> {
        self.status
            .run("count_greater_singles", async {
                let response = self
                    .transport
                    .execute(self.client.build_count_greater_singles(singles_count))
                    .await?;
                self.client.parse_count(response)
            })
            .await
    }

    pub fn clear_current_band(&self) {
        *self.current_band.borrow_mut() = None;
    }

    pub fn clear_bands(&self) {
        self.bands.borrow_mut().clear();
        *self.pagination.borrow_mut() = None;
    }

    pub fn clear_error(&self) {
        self.status.clear_error();
    }

    fn replace_page(&self, page: Page<MusicBand>) {
        *self.bands.borrow_mut() = page.items;
        *self.pagination.borrow_mut() = Some(page.pagination);
    }
}

// ---------------------------------------------------------------------------
// Grammy
// ---------------------------------------------------------------------------

/// State holder for the Grammy actions. Caches nothing; the updated band is
/// returned to the caller.
#[derive(Debug)]
pub struct GrammyViewModel<T> {
    client: GrammyClient,
    transport: T,
    status: Status,
}

impl GrammyViewModel<ReqwestTransport> {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            GrammyClient::new(&config.grammy_base_url),
            ReqwestTransport::new(),
        )
    }
}

impl<T: Transport> GrammyViewModel<T> {
    pub fn new(client: GrammyClient, transport: T) -> Self {
        Self {
            client,
            transport,
            status: Status::default(),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&ViewState) + 'static) -> Subscription<ViewState> {
        self.status.listeners.subscribe(listener)
    }

    pub fn state(&self) -> ViewState {
        self.status.snapshot()
    }

    pub async fn add_single(&self, band_id: i64) -> Result<MusicBand, ApiError> {
        self.status
            .run("add_single", async {
                let response = self
                    .transport
                    .execute(self.client.build_add_single(band_id))
                    .await?;
                self.client.parse_add_single(response)
            })
            .await
    }

    pub async fn remove_participant(&self, band_id: i64) -> Result<MusicBand, ApiError> {
        self.status
            .run("remove_participant", async {
                let response = self
                    .transport
                    .execute(self.client.build_remove_participant(band_id))
                    .await?;
                self.client.parse_remove_participant(response)
            })
            .await
    }

    pub fn clear_error(&self) {
        self.status.clear_error();
    }
}
