//! # Operator Configuration
//!
//! Startup options for the operator process, parsed from command-line flags.
//!
//! Every flag also reads an environment variable, so the same options can be
//! supplied from a ConfigMap using `envFrom` in the deployment. Options are
//! immutable once parsed and are only ever lent out by reference.

mod options;

pub use options::{FatalExitPolicy, LogFormat, ServerOptions};
