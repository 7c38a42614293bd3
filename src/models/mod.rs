//! Data models shared across the pipeline: durable repo models, in-memory
//! submission/monitoring state, API envelopes, and error types.

mod request;
pub use request::*;

mod transaction;
pub use transaction::*;

mod submission;
pub use submission::*;

mod queue;
pub use queue::*;

mod notification;
pub use notification::*;

mod error;
pub use error::*;

mod api_response;
pub use api_response::*;

mod app_state;
pub use app_state::*;
