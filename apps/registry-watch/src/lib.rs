// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod event_log;
pub mod logger;
pub mod notifications;
pub mod paths;
pub mod state;

#[cfg(test)]
mod tests;
