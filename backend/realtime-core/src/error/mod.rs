pub mod config;
pub mod dispatch;
pub mod manager;
pub mod transport;

pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use manager::ManagerError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Dispatch(#[from] dispatch::DispatchError),

    #[error(transparent)]
    Manager(#[from] manager::ManagerError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),
}
