pub mod admin;
pub mod applications;
pub mod auth;
pub mod categories;
pub mod companies;
pub mod employer;
pub mod health;
pub mod jobs;
pub mod profile;
pub mod validate;
