//! Report workshop service library.
//!
//! Aggregates activity reports owned by a remote report service with locally
//! stored workshop rows, resolves those rows against a workshop cache fed by
//! workshop events, and renders cached PDF exports.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod store;
