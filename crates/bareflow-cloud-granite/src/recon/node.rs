//! Node reconciler
//!
//! Node creation is asynchronous: the create call returns a node that may
//! not yet carry a network address. Create therefore runs a bounded
//! readiness poll (fixed interval, hard deadline) before the optional
//! post-create tag update. Changing the image requires replacing the node;
//! the host plans that as delete + create.

use crate::api::{CreateNodeRequest, GraniteApi, UpdateNodeRequest};
use crate::entity::{BillingPeriod, Node};
use crate::recon::{already_absent, client_error, collect, missing_id};
use crate::validate;
use async_trait::async_trait;
use bareflow_cloud::{
    Attr, Diagnostic, Diagnostics, ID_ATTR, Model, OpContext, OpOutcome, PollConfig, PollError,
    Poller, ReadOutcome, Reconciler, Schema, UuidList, UuidString, Validator,
};
use std::sync::Arc;
use std::time::Duration;

/// Wall-clock budget for a freshly created node to publish its primary
/// address, and the fixed pause between probes.
const ADDRESS_POLL: PollConfig = PollConfig {
    timeout: Duration::from_secs(300),
    interval: Duration::from_secs(10),
};

const ATTRS: &[Attr] = &[
    Attr::required("project_id"),
    Attr::required("flavor_id"),
    Attr::required("datacenter_id"),
    Attr::required("image_id"),
    Attr::required("fqdn"),
    Attr::required("billing_period"),
    Attr::optional("password"),
    Attr::optional("ssh_key_ids"),
    Attr::optional("user_data"),
    Attr::optional("tags"),
    Attr::computed("ip"),
    Attr::computed(ID_ATTR),
];
const SCHEMA: Schema = Schema::new(ATTRS);

pub struct NodeReconciler {
    api: Arc<dyn GraniteApi>,
}

impl NodeReconciler {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }

    /// Wait for the node to publish a primary address, refreshing from the
    /// remote side between probes. Fetch errors during the wait are not
    /// fatal; the next lap retries.
    async fn await_address(
        &self,
        ctx: &OpContext,
        model: &mut Model,
        mut node: Node,
    ) -> Result<Node, Diagnostic> {
        let poller = Poller::new(ADDRESS_POLL, ctx.cancel_token().clone());
        while node.primary_address().is_none() {
            match poller.wait().await {
                Ok(()) => {}
                Err(PollError::TimedOut) => {
                    return Err(Diagnostic::error(
                        "Timeout Error",
                        "Unable to get node address",
                    ));
                }
                Err(PollError::Cancelled) => {
                    return Err(Diagnostic::error(
                        "Cancelled",
                        "node creation cancelled while waiting for an address",
                    ));
                }
            }
            if let Ok(fresh) = self.api.get_node(&node.id, &node.project_id).await {
                node = fresh;
                write_node(model, &node);
            }
        }
        Ok(node)
    }
}

fn write_node(model: &mut Model, node: &Node) {
    model.set("project_id", node.project_id.as_str());
    model.set("flavor_id", node.flavor.id.as_str());
    model.set("datacenter_id", node.datacenter.id.as_str());
    model.set("fqdn", node.fqdn.as_str());
    model.set("billing_period", node.billing_period.name());
    model.set("image_id", node.image.id.as_str());
    model.set(ID_ATTR, node.id.as_str());
    if let Some(address) = node.primary_address() {
        model.set("ip", address);
    }
}

#[async_trait]
impl Reconciler for NodeReconciler {
    fn kind(&self) -> &'static str {
        "granite_node"
    }

    fn schema(&self) -> &Schema {
        &SCHEMA
    }

    fn validators(&self) -> Vec<(&'static str, &dyn Validator)> {
        vec![
            ("project_id", &UuidString),
            ("flavor_id", &UuidString),
            ("datacenter_id", &UuidString),
            ("image_id", &UuidString),
            ("ssh_key_ids", &UuidList),
            ("billing_period", validate::billing_period()),
        ]
    }

    async fn create(&self, ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let mut diags = Diagnostics::new();
        let fqdn = collect(declared.require_str("fqdn"), &mut diags);
        let project_id = collect(declared.require_str("project_id"), &mut diags);
        let flavor_id = collect(declared.require_str("flavor_id"), &mut diags);
        let datacenter_id = collect(declared.require_str("datacenter_id"), &mut diags);
        let image_id = collect(declared.require_str("image_id"), &mut diags);
        let billing_period = collect(declared.require_str("billing_period"), &mut diags);
        if diags.has_errors() {
            return OpOutcome::failed(diags);
        }

        let request = CreateNodeRequest {
            fqdns: vec![fqdn.unwrap_or_default()],
            project_id: project_id.unwrap_or_default(),
            flavor_id: flavor_id.unwrap_or_default(),
            datacenter_id: datacenter_id.unwrap_or_default(),
            image_id: image_id.unwrap_or_default(),
            billing_period: BillingPeriod::from_name(&billing_period.unwrap_or_default()),
            password: declared.opt_str("password").map(str::to_string),
            ssh_key_ids: declared.str_list("ssh_key_ids"),
            user_data: declared.opt_str("user_data").map(str::to_string),
        };

        let nodes = match self.api.create_node(request).await {
            Ok(nodes) => nodes,
            Err(err) => return OpOutcome::failed(client_error("create node", &err)),
        };
        let Some(node) = nodes.into_iter().next() else {
            return OpOutcome::failed(Diagnostic::error(
                "Client Error",
                "create node returned an empty node list",
            ));
        };
        write_node(&mut declared, &node);
        tracing::info!(id = %node.id, fqdn = %node.fqdn, "created node, waiting for address");

        let node = match self.await_address(ctx, &mut declared, node).await {
            Ok(node) => node,
            // The node exists remotely; it stays tracked in whatever state
            // the remote side last reported.
            Err(diag) => return OpOutcome::partial(declared, diag.into()),
        };

        let tags = declared.str_map("tags");
        if !tags.is_empty() {
            let request = UpdateNodeRequest {
                id: node.id.clone(),
                project_id: node.project_id.clone(),
                fqdn: node.fqdn.clone(),
                tags,
            };
            match self.api.update_node(request).await {
                Ok(updated) => write_node(&mut declared, &updated),
                Err(err) => {
                    // Partial success: the node was created but is not in
                    // its declared shape.
                    return OpOutcome::partial(
                        declared,
                        client_error("update node after creation", &err).into(),
                    );
                }
            }
        }

        tracing::info!(id = declared.id(), ip = declared.opt_str("ip"), "node ready");
        OpOutcome::ok(declared)
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let Some(id) = declared.id().map(str::to_string) else {
            return ReadOutcome::failed(missing_id("node"));
        };
        let project_id = match declared.require_str("project_id") {
            Ok(project_id) => project_id.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        match self.api.get_node(&id, &project_id).await {
            Ok(node) => {
                write_node(&mut declared, &node);
                ReadOutcome::Fresh(declared)
            }
            Err(err) if err.is_not_found() => ReadOutcome::Gone,
            Err(err) => ReadOutcome::failed(client_error("get node", &err)),
        }
    }

    async fn update(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let mut diags = Diagnostics::new();
        let id = declared.id().map(str::to_string);
        if id.is_none() {
            diags.push(missing_id("node"));
        }
        let project_id = collect(declared.require_str("project_id"), &mut diags);
        let fqdn = collect(declared.require_str("fqdn"), &mut diags);
        if diags.has_errors() {
            return OpOutcome::failed(diags);
        }

        let request = UpdateNodeRequest {
            id: id.unwrap_or_default(),
            project_id: project_id.unwrap_or_default(),
            fqdn: fqdn.unwrap_or_default(),
            tags: declared.str_map("tags"),
        };
        match self.api.update_node(request).await {
            Ok(node) => {
                write_node(&mut declared, &node);
                tracing::info!(id = %node.id, "updated node");
                OpOutcome::ok(declared)
            }
            Err(err) => OpOutcome::failed(client_error("update node", &err)),
        }
    }

    async fn delete(&self, _ctx: &OpContext, declared: Model) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = declared.id() else {
            diags.push(missing_id("node"));
            return diags;
        };
        let project_id = match declared.require_str("project_id") {
            Ok(project_id) => project_id,
            Err(diag) => {
                diags.push(diag);
                return diags;
            }
        };
        match self.api.destroy_node(id, project_id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => diags.push(already_absent("Node", &err)),
            Err(err) => diags.push(client_error("delete node", &err)),
        }
        diags
    }
}
