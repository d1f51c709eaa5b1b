pub mod auth;
pub mod connect;
pub mod meeting;
pub mod meetings;
pub mod settings;
pub mod sync;
