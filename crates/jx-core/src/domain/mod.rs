pub mod application;
pub mod category;
pub mod company;
pub mod job;
pub mod role;
pub mod token;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use category::Category;
pub use company::Company;
pub use job::{Job, JobStatus};
pub use role::Role;
pub use token::RefreshToken;
pub use user::User;
