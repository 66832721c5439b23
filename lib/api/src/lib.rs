//! HTTP surface for matrec.
//!
//! Routes:
//! - `GET  /health`
//! - `GET  /levels`
//! - `GET  /catalogs`
//! - `POST /catalogs/{id}/rank`

pub mod rest;

pub use rest::{configure, ApiError, AppState, RestApi};
