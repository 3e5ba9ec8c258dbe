//! Granite Cloud provider for bareflow
//!
//! This crate binds the generic reconciliation core to the Granite Cloud
//! API: one reconciler per entity kind (project, node, SSH key, billing
//! profile, project image) plus read-only catalog lookups.
//!
//! # Example
//!
//! ```ignore
//! use bareflow_cloud::{Driver, Instance, OpContext};
//! use bareflow_cloud_granite::{registry, transfer::HttpTransfer};
//! use std::sync::Arc;
//!
//! let api: Arc<dyn bareflow_cloud_granite::GraniteApi> = make_client();
//! let driver = Driver::new(registry(api, Arc::new(HttpTransfer::new())));
//!
//! let ctx = OpContext::default();
//! let report = driver.converge(&ctx, instance).await;
//! ```

pub mod api;
pub mod entity;
pub mod error;
pub mod recon;
pub mod registry;
pub mod transfer;
pub mod validate;

pub use api::{
    ApiResult, BillingProfileFields, CreateNodeRequest, CreateProjectImageRequest,
    CreateProjectRequest, CreateSshKeyRequest, GraniteApi, UpdateNodeRequest, UpdateProjectRequest,
};
pub use entity::{
    AuthenticationType, BillingPeriod, BillingProfile, Company, Datacenter, Flavor, Image,
    ImageRef, ImageUpload, NetworkInterface, Node, Project, ProjectEnvironment, SshKey,
};
pub use error::{GraniteError, Result};
pub use recon::{
    BillingProfileReconciler, DatacenterLookup, FlavorLookup, ImageLookup, NodeReconciler,
    ProjectImageReconciler, ProjectLookup, ProjectReconciler, SshKeyReconciler,
};
pub use registry::registry;
pub use transfer::{HttpTransfer, ImageSource, ImageTransfer};
