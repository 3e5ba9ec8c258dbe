//! Entity reconciler contract
//!
//! Every managed entity kind implements the same lifecycle contract. The
//! driver dispatches on kind name through a [`Registry`] of trait objects.

use crate::diag::{Diagnostic, Diagnostics};
use crate::model::{Model, Schema};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-operation context. Cancellation is threaded explicitly through every
/// lifecycle call; long-running loops must check it in addition to their own
/// deadlines.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
}

impl OpContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Result of a Create or Update operation.
///
/// `model` is the declared model enriched with remote-assigned fields. It
/// may be present alongside error diagnostics: a node whose post-create tag
/// update failed, for example, exists remotely and must be tracked even
/// though the operation as a whole failed.
#[derive(Debug, Clone, Default)]
pub struct OpOutcome {
    pub model: Option<Model>,
    pub diags: Diagnostics,
}

impl OpOutcome {
    pub fn ok(model: Model) -> Self {
        Self {
            model: Some(model),
            diags: Diagnostics::new(),
        }
    }

    pub fn failed(diags: impl Into<Diagnostics>) -> Self {
        Self {
            model: None,
            diags: diags.into(),
        }
    }

    /// Remote object exists but the operation did not fully succeed.
    pub fn partial(model: Model, diags: Diagnostics) -> Self {
        Self {
            model: Some(model),
            diags,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.diags.has_errors()
    }
}

/// Result of a Read operation. "Object vanished" is distinct from a
/// transient RPC failure so the caller can drop tracked state only when the
/// remote side confirms absence.
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// Authoritative remote state, refreshed.
    Fresh(Model),
    /// The remote object no longer exists; tracked state must be dropped.
    Gone,
    /// The read itself failed; tracked state must be kept.
    Failed(Diagnostics),
}

impl ReadOutcome {
    pub fn failed(diag: Diagnostic) -> Self {
        ReadOutcome::Failed(diag.into())
    }
}

/// Lifecycle contract implemented by every entity kind.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Stable kind name the driver dispatches on.
    fn kind(&self) -> &'static str;

    fn schema(&self) -> &Schema;

    /// Validators bound to declared attributes, run pre-RPC.
    fn validators(&self) -> Vec<(&'static str, &dyn crate::validate::Validator)> {
        Vec::new()
    }

    /// Validate every bound attribute of a declared model. Pure, no I/O.
    fn validate(&self, declared: &Model) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for (attribute, validator) in self.validators() {
            diags.extend(validator.validate(attribute, declared.get(attribute)));
        }
        diags
    }

    /// Create the remote object and merge remote-assigned fields into the
    /// declared model.
    async fn create(&self, ctx: &OpContext, declared: Model) -> OpOutcome {
        let _ = (ctx, declared);
        OpOutcome::failed(unsupported(self.kind(), "create"))
    }

    /// Refresh the declared model from authoritative remote state.
    async fn read(&self, ctx: &OpContext, declared: Model) -> ReadOutcome;

    /// Push mutable declared fields to the remote object. Kinds that are
    /// immutable remotely reject this with a fatal diagnostic.
    async fn update(&self, ctx: &OpContext, declared: Model) -> OpOutcome {
        let _ = (ctx, declared);
        OpOutcome::failed(unsupported(self.kind(), "update"))
    }

    /// Delete the remote object. A not-found failure is downgraded to a
    /// warning: the desired end state already holds.
    async fn delete(&self, ctx: &OpContext, declared: Model) -> Diagnostics {
        let _ = (ctx, declared);
        unsupported(self.kind(), "delete").into()
    }

    /// Seed a declared model from an external identifier. Kinds without a
    /// stable identifier attribute cannot be imported.
    fn import(&self, external_id: &str) -> Result<Model, Diagnostic> {
        if !self.schema().importable() {
            return Err(unsupported(self.kind(), "import"));
        }
        Ok(Model::with_id(external_id))
    }
}

fn unsupported(kind: &str, operation: &str) -> Diagnostic {
    Diagnostic::error(
        "Unsupported operation",
        format!("{kind} does not support {operation}"),
    )
}

/// Maps kind name to reconciler implementation for driver dispatch.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<&'static str, Arc<dyn Reconciler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, reconciler: Arc<dyn Reconciler>) {
        self.entries.insert(reconciler.kind(), reconciler);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Reconciler>> {
        self.entries.get(kind).cloned()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.entries.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}
