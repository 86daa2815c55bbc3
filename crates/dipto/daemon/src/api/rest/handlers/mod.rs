//! API request handlers

mod auth;
mod courses;
mod describe;
mod health;
mod site;

pub use auth::*;
pub use courses::*;
pub use describe::*;
pub use health::*;
pub use site::*;
