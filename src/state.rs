use crate::api::client::ApiClient;
use crate::config::Config;
use crate::domain::filter::{paginate, LeadFilter, Page};
use crate::domain::lead::Lead;
use crate::domain::models::{Assignment, SalesUser};
use crate::domain::reconcile;
use crate::error::AppResult;
use crate::services::geo::{FixedGeolocator, Geolocator, ReverseGeocoder};
use crate::storage::assignment_cache::AssignmentCache;
use crate::storage::local_store::LocalStore;
use crate::storage::outbox::Outbox;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub config: Config,
    pub store: Arc<LocalStore>,
    pub api: ApiClient,
    pub cache: AssignmentCache,
    pub outbox: Outbox,
    pub geolocator: Arc<dyn Geolocator>,
    pub geocoder: ReverseGeocoder,
    pub boards: LeadBoards,
    pub shutdown: CancellationToken,
}

pub type SharedState = Arc<AppState>;

/// `STORAGE_PATH` value that keeps the local store in memory only.
pub const IN_MEMORY_STORAGE: &str = ":memory:";

impl AppState {
    pub async fn build(config: Config) -> AppResult<Self> {
        let store = if config.storage_path == IN_MEMORY_STORAGE {
            tracing::warn!("Using in-memory storage; cached assignments and the outbox will not survive a restart");
            Arc::new(LocalStore::in_memory())
        } else {
            Arc::new(LocalStore::open(&config.storage_path).await?)
        };
        let geolocator: Arc<dyn Geolocator> = Arc::new(FixedGeolocator::new(config.office_lat, config.office_long));
        Self::with_parts(config, store, geolocator)
    }

    pub fn with_parts(config: Config, store: Arc<LocalStore>, geolocator: Arc<dyn Geolocator>) -> AppResult<Self> {
        let shutdown = CancellationToken::new();
        let api = ApiClient::new(&config.api_base_url, config.request_timeout, store.clone(), shutdown.clone())?;
        let geocoder = ReverseGeocoder::new(&config.geocoder_url, config.request_timeout)?;
        Ok(Self {
            boards: LeadBoards::new(config.page_size),
            cache: AssignmentCache::new(store.clone()),
            outbox: Outbox::new(store.clone()),
            config,
            store,
            api,
            geolocator,
            geocoder,
            shutdown,
        })
    }
}

/// Boards kept at once; the least recently used one is dropped beyond this.
pub const MAX_SESSIONS: usize = 64;

/// One `LeadBoard` per caller, keyed by the bearer token that loaded it.
/// A board is never handed to a different token.
pub struct LeadBoards {
    page_size: usize,
    sessions: RwLock<HashMap<String, (LeadBoard, u64)>>,
    clock: AtomicU64,
}

impl LeadBoards {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    pub async fn is_loaded(&self, session: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(session)
            .is_some_and(|(board, _)| board.is_loaded())
    }

    /// Runs `f` on the caller's board, creating an empty one first if needed.
    pub async fn with_board<R>(&self, session: &str, f: impl FnOnce(&mut LeadBoard) -> R) -> R {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session) && sessions.len() >= MAX_SESSIONS {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!("Dropped least recently used lead board");
            }
        }
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        let (board, used) = sessions
            .entry(session.to_string())
            .or_insert_with(|| (LeadBoard::new(self.page_size), tick));
        *used = tick;
        f(board)
    }

    pub async fn users(&self, session: &str) -> Vec<SalesUser> {
        self.sessions
            .read()
            .await
            .get(session)
            .map(|(board, _)| board.users().to_vec())
            .unwrap_or_default()
    }

    /// Shows `assignment` on every board holding its lead.
    pub async fn assign_everywhere(&self, assignment: &Assignment, pending_sync: bool) -> usize {
        let mut sessions = self.sessions.write().await;
        sessions
            .values_mut()
            .filter(|(board, _)| board.is_loaded())
            .map(|(board, _)| board.assign_local(assignment, pending_sync))
            .filter(|shown| *shown)
            .count()
    }

    /// Takes a refused pending assignment off every board, restoring
    /// `previous` when one is known.
    pub async fn revert_pending_everywhere(&self, lead_id: &str, previous: Option<&Assignment>) {
        let mut sessions = self.sessions.write().await;
        for (board, _) in sessions.values_mut() {
            board.revert_pending(lead_id, previous);
        }
    }
}

/// State behind the lead page: the fetched collection, the active filter
/// and the current page. All mutation goes through these methods.
#[derive(Debug, Clone)]
pub struct LeadBoard {
    leads: Vec<Lead>,
    users: Vec<SalesUser>,
    filter: LeadFilter,
    page: usize,
    page_size: usize,
    loaded_at: Option<DateTime<Utc>>,
}

impl LeadBoard {
    pub fn new(page_size: usize) -> Self {
        Self {
            leads: Vec::new(),
            users: Vec::new(),
            filter: LeadFilter::default(),
            page: 1,
            page_size: page_size.max(1),
            loaded_at: None,
        }
    }

    pub fn replace_leads(&mut self, leads: Vec<Lead>, users: Vec<SalesUser>) {
        self.leads = leads;
        self.users = users;
        self.loaded_at = Some(Utc::now());
        self.clamp_page();
    }

    pub fn apply_assignments(&mut self, assignments: &[Assignment]) -> usize {
        reconcile::reconcile(&mut self.leads, assignments, &self.users)
    }

    pub fn apply_pending(&mut self, assignments: &[Assignment]) -> usize {
        reconcile::overlay_pending(&mut self.leads, assignments, &self.users)
    }

    /// Shows one assignment on its lead right away. Returns false when the
    /// lead is not on the board.
    pub fn assign_local(&mut self, assignment: &Assignment, pending_sync: bool) -> bool {
        let Some(lead) = self.leads.iter_mut().find(|l| l.id == assignment.lead_id) else {
            return false;
        };
        lead.assignment = Some(reconcile::to_lead_assignment(assignment, &self.users, pending_sync));
        true
    }

    /// Drops the assignment shown on `lead_id` if it is still pending.
    pub fn revert_pending(&mut self, lead_id: &str, previous: Option<&Assignment>) {
        let users = &self.users;
        if let Some(lead) = self
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id && l.assignment.as_ref().is_some_and(|a| a.pending_sync))
        {
            lead.assignment = previous.map(|a| reconcile::to_lead_assignment(a, users, false));
        }
    }

    /// Moves the board to `filter` and returns the visible page. A new
    /// filter or page size starts over at page 1 unless a page is asked for.
    pub fn show(&mut self, filter: LeadFilter, page: Option<usize>, page_size: Option<usize>) -> Page<Lead> {
        self.set_filter(filter);
        if let Some(size) = page_size {
            self.set_page_size(size);
        }
        if let Some(page) = page {
            self.set_page(page);
        }
        self.visible()
    }

    /// Any change of filter sends the view back to page 1.
    pub fn set_filter(&mut self, filter: LeadFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size > 0 && page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    pub fn visible(&self) -> Page<Lead> {
        let filtered: Vec<Lead> = self.filter.apply(&self.leads).into_iter().cloned().collect();
        paginate(&filtered, self.page, self.page_size)
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn users(&self) -> &[SalesUser] {
        &self.users
    }

    pub fn filter(&self) -> &LeadFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    fn clamp_page(&mut self) {
        let total_pages = self.filter.apply(&self.leads).len().div_ceil(self.page_size).max(1);
        self.page = self.page.min(total_pages);
    }
}
