pub mod applications;
pub mod auth;
pub mod categories;
pub mod companies;
pub mod jobs;
pub mod stats;
pub mod users;
