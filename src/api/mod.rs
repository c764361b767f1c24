//! REST API surface

pub mod health;
pub mod openapi;
pub mod verification;
