pub mod api;
pub mod auth;
pub mod db;
pub mod domain;
pub mod logging;
pub mod pagination;
pub mod schema;
