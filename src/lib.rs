//! isekai-api - population statistics over a relational store
//!
//! HTTP CRUD over reference tables and persons, plus filtered count and
//! age statistics.
//!
//! - [`stats`]: code resolution, filter clauses and aggregates
//! - [`store`]: the tabular data store (PostgreSQL or in-memory)
//! - [`http_server`]: axum routes and problem responses

pub mod cli;
pub mod config;
pub mod http_server;
pub mod model;
pub mod observability;
pub mod stats;
pub mod store;
