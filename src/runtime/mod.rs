//! # Runtime Module
//!
//! Runtime components of the operator process: the startup/shutdown
//! orchestrator and the default controller run loop.

pub mod controller;
pub mod orchestrator;

pub use controller::*;
pub use orchestrator::*;
