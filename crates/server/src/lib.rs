//! HTTP API for the qamatch question matcher.
//!
//! Serves a single loaded catalog:
//!
//! - `POST /chat` - `{"question": "..."}` in, `{"answer": "..."}` out
//! - `GET /health` - liveness plus catalog summary
//!
//! The [`MatcherContext`](qamatch_knowledge::MatcherContext) is loaded before
//! the listener binds and is shared read-only by every request.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
