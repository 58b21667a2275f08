use std::sync::Arc;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::credits::CreditLedger;
use crate::criteria::CriteriaStore;
use crate::llm_client::LanguageModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read-only school catalogue, loaded once at startup.
    pub criteria: Arc<CriteriaStore>,
    pub llm: Arc<dyn LanguageModel>,
    pub ledger: Arc<dyn CreditLedger>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Config,
}
