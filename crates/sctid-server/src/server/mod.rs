//! HTTP front end for the identifier service.
//!
//! ## Structure
//!
//! - [`config`] - CLI and environment configuration.
//! - [`error`] - mapping of library errors to HTTP responses.
//! - [`handler`] - routes and request handlers.
//! - [`state`] - shared service state and startup loading.
//! - [`telemetry`] - log output, OpenTelemetry export and metric handles.

pub mod config;
pub mod error;
pub mod handler;
pub mod state;
pub mod telemetry;
