//! CLI command implementations.

mod auth;
mod donations;
mod exchanges;
mod items;
mod messages;
mod points;

pub use auth::{login, logout, register, status};
pub use donations::{donations_create, donations_list};
pub use exchanges::{exchanges_accept, exchanges_list, exchanges_reject, exchanges_request};
pub use items::{items_add, items_delete, items_list, items_mine, items_show, AddItemArgs};
pub use messages::{messages_conversations, messages_send, messages_start, messages_thread};
pub use points::{points_balance, points_history};

use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use ecoswap_config::{Config, Paths};
use ecoswap_marketplace::{Marketplace, MarketplaceError};
use ecoswap_session::{ApiClient, ReqwestTransport, SessionManager};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs: the persisted session and the API wrappers.
pub struct Context {
    pub session: Arc<SessionManager>,
    pub market: Marketplace,
}

impl Context {
    /// Open the session stored under `paths`, talking to the configured API.
    pub fn open(paths: &Paths, config: &Config) -> Result<Self> {
        paths.ensure_dirs()?;

        let base_url = config.api_base_url()?;
        let transport = ReqwestTransport::new(base_url.clone(), config.request_timeout())
            .context("Failed to build HTTP client")?;
        let credentials = ecoswap_storage::open_credential_store(&paths.session_file())
            .with_context(|| {
                format!("Failed to open session file {}", paths.session_file().display())
            })?;

        let refresh_config =
            ecoswap_session::RefreshConfig::default().with_timeout(config.refresh_timeout());
        let session = Arc::new(SessionManager::new(
            Arc::new(transport),
            credentials,
            refresh_config,
        ));
        debug!(api = %base_url, state = %session.state(), "Session opened");

        Ok(Self {
            market: Marketplace::new(ApiClient::new(session.clone())),
            session,
        })
    }
}

/// Report a failed marketplace call. Expired sessions get a login hint
/// instead of the raw error.
pub fn report(err: MarketplaceError, format: &OutputFormat) -> Result<()> {
    if err.requires_login() {
        output::print_error("Not logged in (or session expired). Run 'ecoswap login'.", format);
        return Ok(());
    }
    Err(err.into())
}
