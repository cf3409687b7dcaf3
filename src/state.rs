// src/state.rs

use std::sync::Arc;

use crate::{
    api::{ExamApi, HttpApi},
    config::Config,
    controllers::auth::AuthService,
    error::AppError,
    media::PreviewRegistry,
    session::{FileStore, SessionContext},
};

/// Everything a view needs, built once at startup and shared by cloning.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionContext>,
    pub api: Arc<dyn ExamApi>,
    pub previews: Arc<PreviewRegistry>,
}

impl AppState {
    /// Restores the persisted session and wires the HTTP client to it.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let store = FileStore::new(config.session_file.clone());
        let session = Arc::new(SessionContext::restore(Box::new(store))?);
        let api = HttpApi::new(&config, Arc::clone(&session))?;

        Ok(Self {
            config,
            session,
            api: Arc::new(api),
            previews: PreviewRegistry::new(),
        })
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(Arc::clone(&self.api), Arc::clone(&self.session))
    }
}
