mod config;
mod state;
mod support;
