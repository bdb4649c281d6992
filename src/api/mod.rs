/*
 * Responsibility
 * - HTTP surface: routes, handlers, DTOs, extractors
 * - routes() is the only entry point used by app.rs
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
