mod helpers;
mod manager;
