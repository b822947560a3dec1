//! HTTP API for submitting generation jobs and polling their results.

pub mod config;
pub mod error;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
