//! Escrow relayer: accepts pre-signed ledger transactions, broadcasts them
//! through a gateway with bounded retries, and tracks each broadcast to a
//! confirmed or failed terminal state.
//!
//! The pipeline is four cooperating pieces:
//! - the submission tracker, which owns the attempt loop and the
//!   one-active-submission-per-request invariant,
//! - the holding queue and its driver for deferred submissions,
//! - the batch manager, a semaphore-bounded fan-out over the tracker,
//! - the confirmation monitor, which polls broadcast transactions until
//!   they reach the required confirmation depth or time out.

pub mod api;
pub mod config;
pub mod constants;
pub mod domain;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{ApiError, AppState, DefaultAppState};
