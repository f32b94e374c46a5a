//! REST API module
//!
//! This module provides the HTTP server and REST API endpoints including:
//! - API routing and request handling
//! - Token authentication on owner-scoped routes
//! - Trace IDs and security headers
//! - Error handling and response formatting

pub mod server;
pub mod routes;
pub mod middleware;
pub mod handlers;
pub mod models;
pub mod extract;


pub use server::ApiServer;
pub use handlers::AppState;
pub use middleware::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
