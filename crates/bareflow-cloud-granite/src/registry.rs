//! Kind registration

use crate::api::GraniteApi;
use crate::recon::{
    BillingProfileReconciler, DatacenterLookup, FlavorLookup, ImageLookup, NodeReconciler,
    ProjectImageReconciler, ProjectLookup, ProjectReconciler, SshKeyReconciler,
};
use crate::transfer::ImageTransfer;
use bareflow_cloud::Registry;
use std::sync::Arc;

/// Build a registry with every Granite entity kind, ready to hand to a
/// [`bareflow_cloud::Driver`].
pub fn registry(api: Arc<dyn GraniteApi>, transfer: Arc<dyn ImageTransfer>) -> Registry {
    let mut registry = Registry::new();
    registry.register(Arc::new(ProjectReconciler::new(api.clone())));
    registry.register(Arc::new(NodeReconciler::new(api.clone())));
    registry.register(Arc::new(SshKeyReconciler::new(api.clone())));
    registry.register(Arc::new(BillingProfileReconciler::new(api.clone())));
    registry.register(Arc::new(ProjectImageReconciler::new(api.clone(), transfer)));
    registry.register(Arc::new(DatacenterLookup::new(api.clone())));
    registry.register(Arc::new(FlavorLookup::new(api.clone())));
    registry.register(Arc::new(ImageLookup::new(api.clone())));
    registry.register(Arc::new(ProjectLookup::new(api)));
    registry
}
