//! API layer for diptod

pub mod rest;

pub use rest::{create_router, AppState};
