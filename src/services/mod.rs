//! External collaborators: the ledger gateway the pipeline broadcasts
//! through and the webhook sink it pushes status changes to.

mod gateway;
pub use gateway::*;

mod webhook;
pub use webhook::*;
