//! bareflow cloud reconciliation core
//!
//! Generic contract for driving a remote cloud API toward operator-declared
//! state. Every managed entity kind implements the same lifecycle
//! (create/read/update/delete/import) over a tri-state declared model; the
//! driver sequences those operations per instance and runs independent
//! instances concurrently.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            host (plan / persist)             │
//! └──────────────────┬───────────────────────────┘
//!                    │ declared models
//! ┌──────────────────▼───────────────────────────┐
//! │              bareflow-cloud                  │
//! │  Driver ── Registry ── trait Reconciler      │
//! │  Model / Value / Schema     Poller / diags   │
//! └──────────────────┬───────────────────────────┘
//!                    │ typed RPC (RpcError codes)
//! ┌──────────────────▼───────────────────────────┐
//! │        provider crate (entity client)        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The declarative diff, authentication and transport live outside this
//! crate; it consumes a typed client and produces state mutations plus
//! diagnostics.

pub mod diag;
pub mod driver;
pub mod error;
pub mod model;
pub mod poll;
pub mod reconciler;
pub mod validate;
pub mod value;

// Re-exports
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use driver::{Converged, Destroyed, Driver, Instance};
pub use error::{ErrorCode, RpcError};
pub use model::{Attr, AttrKind, ID_ATTR, Model, Schema};
pub use poll::{PollConfig, PollError, Poller};
pub use reconciler::{OpContext, OpOutcome, ReadOutcome, Reconciler, Registry};
pub use validate::{OneOf, UuidList, UuidString, Validator};
pub use value::Value;
