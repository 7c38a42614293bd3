//! HTTP surface: thin route handlers over controllers that hold the
//! actual request/response logic.

pub mod controllers;
pub mod routes;
