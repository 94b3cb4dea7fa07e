//! Lazily built, single shared manager.

use crate::config::ManagerConfig;
use crate::error::manager::ManagerError;
use crate::manager::RealtimeManager;

use log::info;
use once_cell::sync::OnceCell;

/// Holds the one manager an application should use.
///
/// Owned by the composition root and handed to whoever needs the
/// connection. The manager is built on the first [`get`](Self::get) with the
/// config fixed at construction; later calls return the same instance. There
/// is no teardown beyond [`RealtimeManager::disconnect`].
pub struct SharedManager {
    config: ManagerConfig,
    instance: OnceCell<RealtimeManager>,
}

impl SharedManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            instance: OnceCell::new(),
        }
    }

    /// # Errors
    ///
    /// Propagates [`RealtimeManager::new`] errors from the first call. A failed
    /// first call leaves the slot empty so a later call can retry.
    pub fn get(&self) -> Result<&RealtimeManager, ManagerError> {
        self.instance.get_or_try_init(|| {
            info!("Creating shared realtime manager");
            RealtimeManager::new(self.config.clone())
        })
    }

    /// The manager, if [`get`](Self::get) has already built it.
    pub fn get_if_created(&self) -> Option<&RealtimeManager> {
        self.instance.get()
    }

    /// Configuration the manager is (or will be) built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}
