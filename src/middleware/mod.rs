/*
 * Responsibility
 * - Public interface of the middleware layer
 * - Router-wide layers (http / cors / security_headers) and the per-route access gate
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
