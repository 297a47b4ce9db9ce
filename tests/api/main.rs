//! HTTP-level tests for the report workshop service.
//!
//! The app is assembled from in-memory stores and an in-process report
//! gateway; the gateway tests talk to a fake remote service over a real socket.

mod cache_api;
mod common;
mod gateway_http;
mod reports_api;
