mod error;
mod event_log;
mod logger;
