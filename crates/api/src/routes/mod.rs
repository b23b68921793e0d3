//! HTTP route handlers.

pub mod todo;
pub mod weather;
