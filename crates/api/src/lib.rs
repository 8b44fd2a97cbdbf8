//! HTTP API: routing and request/response mapping over the engine.

pub mod app;
