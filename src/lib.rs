pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod meetings;
pub mod models;
pub mod notifications;
pub mod records;
pub mod routes;
pub mod routing;
pub mod schema;
pub mod state;
pub mod store;
pub mod submission;
pub mod summary;
pub mod tracking;
pub mod workflow;
