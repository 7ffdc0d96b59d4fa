//! Database models split into domain-specific modules.

pub mod admin;
pub mod assignment;
pub mod common;
pub mod course;
pub mod program;
pub mod session;
pub mod study_center;
pub mod user;

pub use admin::*;
pub use assignment::*;
pub use common::*;
pub use course::*;
pub use program::*;
pub use session::*;
pub use study_center::*;
pub use user::*;
