//! estate_crm: a real-estate CRM backend in Rust
//!
//! Leads, properties, agents, messages and activities kept in a Sled
//! document store and served over an Axum REST API, plus the client pieces
//! that consume it (query cache, HTTP client and create flow).
//!
//! The server binary mounts [`rest::create_router`]; the maintenance
//! scripts use [`admin`] directly against [`storage::Store`].

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod validation;
// Sled-backed document store, one tree per collection
pub mod storage;
pub mod auth;
pub mod display;
pub mod stats;
// REST API module: Axum handlers for CRUD, auth and HTML fragments
pub mod rest;
pub mod query_cache;
pub mod api_client;
pub mod create_flow;
pub mod admin;
