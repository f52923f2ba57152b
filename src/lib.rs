/*!
 * Shopbook Core - Library Interface
 *
 * Exposes the booking core's internal modules for use in integration tests
 * and as a library. The binary entry point is in main.rs.
 */

// Public module declarations
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
