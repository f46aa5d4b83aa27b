//! A fixed monitor layout taken from `[[layout.monitors]]` in the config file.
//!
//! Useful on headless machines and for running the server without a
//! compositor. The probe fails when no monitors are configured so the chain
//! moves on.

use async_trait::async_trait;
use sunmonlok_core::MonitorRect;

use crate::application::resolve_monitor::{MonitorLayoutProvider, ProviderError};

pub struct StaticLayoutProvider {
    monitors: Vec<MonitorRect>,
}

impl StaticLayoutProvider {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self { monitors }
    }
}

#[async_trait]
impl MonitorLayoutProvider for StaticLayoutProvider {
    async fn probe(&self) -> Result<(), ProviderError> {
        if self.monitors.is_empty() {
            return Err(ProviderError::BackendUnavailable {
                backend: "static".to_string(),
                reason: "no [[layout.monitors]] configured".to_string(),
            });
        }
        Ok(())
    }

    async fn list_monitors(&self) -> Result<Vec<MonitorRect>, ProviderError> {
        Ok(self.monitors.clone())
    }
}
