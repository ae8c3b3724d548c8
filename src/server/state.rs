// src/server/state.rs

use std::sync::Arc;

use crate::exec::CommandRunner;
use crate::server::ServerConfig;
use crate::server::registry::RunRegistry;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RunRegistry>,
    pub config: Arc<ServerConfig>,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(config: ServerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            registry: Arc::new(RunRegistry::new()),
            config: Arc::new(config),
            runner,
        }
    }
}
