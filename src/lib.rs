pub mod api;
pub mod app;
pub mod state;
pub mod storage;
pub mod store;
pub mod utils;

#[cfg(feature = "gui")]
pub mod ui;

#[cfg(test)]
mod testing;
