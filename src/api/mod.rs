pub mod contacts;
pub mod draft;
pub mod models;
pub mod sender;
