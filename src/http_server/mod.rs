//! # HTTP Server Module
//!
//! axum server exposing the population API over a [`PopulationStore`].
//!
//! # Endpoints
//!
//! - `/`, `/health` - Welcome and health check
//! - `/v1/info/*` - Reference code listings
//! - `/v1/{genders,species,strata}` - Reference rows
//! - `/v1/persons` - Person CRUD
//! - `/v1/stats/*` - Filtered count and age statistics
//! - `/observability/*` - Request counters
//!
//! [`PopulationStore`]: crate::store::PopulationStore

pub mod config;
pub mod middleware;
pub mod observability_routes;
pub mod persons_routes;
pub mod problem;
pub mod reference_routes;
pub mod server;
pub mod state;
pub mod stats_routes;

pub use config::HttpServerConfig;
pub use problem::{ApiError, ApiResult, ProblemDetails, PROBLEM_CONTENT_TYPE};
pub use server::HttpServer;
pub use state::AppState;
