//! Library exports for portalgate, shared between the binary and tests.

pub mod cache;
pub mod config;
pub mod guards;
pub mod models;
pub mod routes;
pub mod session;
pub mod startup;
pub mod state;
pub mod utils;
