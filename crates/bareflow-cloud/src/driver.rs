//! Reconciliation driver
//!
//! The generic lifecycle state machine every entity reconciler plugs into:
//! Create → [Poll] → Read → Update* → Delete. The driver owns dispatch and
//! sequencing; the plan (which instances exist, in what order) belongs to
//! the host. Within one declared instance the lifecycle is strictly
//! sequential; independent instances converge concurrently, one task each.

use crate::diag::{Diagnostic, Diagnostics};
use crate::model::Model;
use crate::reconciler::{OpContext, ReadOutcome, Reconciler, Registry};
use std::sync::Arc;
use tokio::task::JoinSet;

/// One declared instance handed to the driver by the host.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Entity kind, resolved through the registry.
    pub kind: String,
    /// Host-side instance name, echoed back in the report.
    pub name: String,
    /// Operator-declared desired state.
    pub desired: Model,
    /// Previously persisted state, if the instance is already tracked.
    pub tracked: Option<Model>,
}

/// Outcome of converging one instance.
#[derive(Debug, Clone)]
pub struct Converged {
    pub name: String,
    pub kind: String,
    /// State to persist. `None` means nothing is tracked afterwards.
    pub state: Option<Model>,
    pub diags: Diagnostics,
}

impl Converged {
    pub fn is_success(&self) -> bool {
        !self.diags.has_errors()
    }
}

/// Outcome of destroying one instance.
#[derive(Debug, Clone)]
pub struct Destroyed {
    /// True when the tracked state must be dropped: the delete succeeded or
    /// the object was already absent.
    pub removed: bool,
    pub diags: Diagnostics,
}

#[derive(Clone)]
pub struct Driver {
    registry: Arc<Registry>,
}

impl Driver {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    fn reconciler(&self, kind: &str) -> Result<Arc<dyn Reconciler>, Diagnostic> {
        self.registry.get(kind).ok_or_else(|| {
            Diagnostic::error("Unknown entity kind", format!("no reconciler registered for {kind:?}"))
        })
    }

    /// Drive one instance to its declared state.
    pub async fn converge(&self, ctx: &OpContext, instance: Instance) -> Converged {
        let Instance {
            kind,
            name,
            desired,
            tracked,
        } = instance;

        let rec = match self.reconciler(&kind) {
            Ok(rec) => rec,
            Err(diag) => {
                return Converged {
                    name,
                    kind,
                    state: tracked,
                    diags: diag.into(),
                };
            }
        };

        let (state, diags) = match tracked {
            None => self.create(&rec, ctx, desired).await,
            Some(tracked) => match rec.read(ctx, tracked.clone()).await {
                ReadOutcome::Failed(diags) => {
                    // Transient failure: never silently drop tracked state.
                    (Some(tracked), diags)
                }
                ReadOutcome::Gone => {
                    tracing::info!(%kind, %name, "tracked object vanished, recreating");
                    self.create(&rec, ctx, desired).await
                }
                ReadOutcome::Fresh(remote) => {
                    let mut want = desired;
                    want.inherit_computed(rec.schema(), &remote);
                    if want.drifts_from(rec.schema(), &remote) {
                        self.update(&rec, ctx, want, remote).await
                    } else {
                        (Some(remote), Diagnostics::new())
                    }
                }
            },
        };

        Converged {
            name,
            kind,
            state,
            diags,
        }
    }

    async fn create(
        &self,
        rec: &Arc<dyn Reconciler>,
        ctx: &OpContext,
        desired: Model,
    ) -> (Option<Model>, Diagnostics) {
        let diags = rec.validate(&desired);
        if diags.has_errors() {
            return (None, diags);
        }
        tracing::info!(kind = rec.kind(), "creating");
        let outcome = rec.create(ctx, desired).await;
        (outcome.model, outcome.diags)
    }

    async fn update(
        &self,
        rec: &Arc<dyn Reconciler>,
        ctx: &OpContext,
        want: Model,
        remote: Model,
    ) -> (Option<Model>, Diagnostics) {
        let diags = rec.validate(&want);
        if diags.has_errors() {
            // Pre-RPC failure: the refreshed remote state stays tracked.
            return (Some(remote), diags);
        }
        tracing::info!(kind = rec.kind(), id = want.id(), "updating");
        let outcome = rec.update(ctx, want).await;
        match outcome.model {
            Some(model) => (Some(model), outcome.diags),
            None => (Some(remote), outcome.diags),
        }
    }

    /// Delete one tracked instance. A warning-only result still counts as
    /// removed: the desired end state (absence) holds.
    pub async fn destroy(&self, ctx: &OpContext, kind: &str, tracked: Model) -> Destroyed {
        let rec = match self.reconciler(kind) {
            Ok(rec) => rec,
            Err(diag) => {
                return Destroyed {
                    removed: false,
                    diags: diag.into(),
                };
            }
        };
        tracing::info!(%kind, id = tracked.id(), "deleting");
        let diags = rec.delete(ctx, tracked).await;
        Destroyed {
            removed: !diags.has_errors(),
            diags,
        }
    }

    /// Seed a declared model from an external identifier.
    pub fn import(&self, kind: &str, external_id: &str) -> Result<Model, Diagnostic> {
        self.reconciler(kind)?.import(external_id)
    }

    /// Converge independent instances concurrently, one task per instance.
    /// Results are returned in input order.
    pub async fn converge_all(&self, ctx: &OpContext, instances: Vec<Instance>) -> Vec<Converged> {
        let mut tasks = JoinSet::new();
        for (index, instance) in instances.into_iter().enumerate() {
            let driver = self.clone();
            let ctx = ctx.clone();
            tasks.spawn(async move { (index, driver.converge(&ctx, instance).await) });
        }

        let mut results: Vec<Option<Converged>> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, converged)) => {
                    if results.len() <= index {
                        results.resize_with(index + 1, || None);
                    }
                    results[index] = Some(converged);
                }
                Err(err) => {
                    tracing::error!(error = %err, "converge task panicked");
                }
            }
        }
        results.into_iter().flatten().collect()
    }
}
