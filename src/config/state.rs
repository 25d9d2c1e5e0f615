// Application state module
// Shared, read-only handles used by every request handler

use minijinja::Environment;

use super::types::Config;
use crate::error::AppError;
use crate::handler::render;
use crate::store::Store;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Store,
    /// Template environment shared by `/render` and `/connect`
    pub templates: Environment<'static>,
}

impl AppState {
    /// Open the product store and build the template environment
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let store = Store::open(&config.database)?;
        let templates = render::build_environment(config);

        Ok(Self {
            config: config.clone(),
            store,
            templates,
        })
    }
}
