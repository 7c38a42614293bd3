//! Core pipeline logic: the submission tracker, the priority queue and its
//! driver, the bounded batch fan-out, and the confirmation monitor.

mod tracker;
pub use tracker::*;

mod queue;
pub use queue::*;

mod batch;
pub use batch::*;

mod monitor;
pub use monitor::*;
