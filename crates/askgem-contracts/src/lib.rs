pub mod chat;
pub mod errors;
pub mod events;
pub mod images;
pub mod limits;
pub mod models;
pub mod request;
pub mod settings;
