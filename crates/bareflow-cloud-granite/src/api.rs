//! Typed Granite Cloud client boundary
//!
//! The reconcilers consume this trait; the transport and authentication
//! behind it are out of scope. The handle is long-lived and concurrency-safe;
//! its configuration is never mutated after construction.

use crate::entity::{
    BillingPeriod, BillingProfile, Datacenter, Flavor, Image, Node, Project, ProjectEnvironment,
    SshKey,
};
use async_trait::async_trait;
use bareflow_cloud::RpcError;
use std::collections::BTreeMap;

pub type ApiResult<T> = Result<T, RpcError>;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
    pub environment: ProjectEnvironment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProjectRequest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub environment: ProjectEnvironment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateNodeRequest {
    pub fqdns: Vec<String>,
    pub project_id: String,
    pub flavor_id: String,
    pub datacenter_id: String,
    pub image_id: String,
    pub billing_period: BillingPeriod,
    /// Optional declared fields are omitted, never sent empty.
    pub password: Option<String>,
    pub ssh_key_ids: Vec<String>,
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateNodeRequest {
    pub id: String,
    pub project_id: String,
    /// Required by the remote API on every update, even tag-only ones.
    pub fqdn: String,
    /// Complete desired tag map; the remote side replaces wholesale.
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSshKeyRequest {
    pub name: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingProfileFields {
    pub name: String,
    pub country_code: String,
    pub state: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub billing_email: String,
    pub company: Option<String>,
    pub vat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateProjectImageRequest {
    pub project_id: String,
    pub name: String,
    pub authentication_types: Vec<crate::entity::AuthenticationType>,
}

/// Typed request/response operations per entity kind. All calls are
/// synchronous RPCs from the reconcilers' point of view.
#[async_trait]
pub trait GraniteApi: Send + Sync {
    // Projects
    async fn create_project(&self, req: CreateProjectRequest) -> ApiResult<Project>;
    async fn get_project(&self, id: &str) -> ApiResult<Project>;
    async fn update_project(&self, req: UpdateProjectRequest) -> ApiResult<Project>;
    async fn delete_project(&self, id: &str) -> ApiResult<()>;

    // Nodes
    async fn create_node(&self, req: CreateNodeRequest) -> ApiResult<Vec<Node>>;
    async fn get_node(&self, id: &str, project_id: &str) -> ApiResult<Node>;
    async fn update_node(&self, req: UpdateNodeRequest) -> ApiResult<Node>;
    async fn destroy_node(&self, id: &str, project_id: &str) -> ApiResult<()>;

    // SSH keys (user-scoped, name-unique)
    async fn create_ssh_key(&self, req: CreateSshKeyRequest) -> ApiResult<SshKey>;
    async fn list_ssh_keys(&self) -> ApiResult<Vec<SshKey>>;
    async fn delete_ssh_key(&self, id: &str) -> ApiResult<()>;

    // Billing profiles (user-scoped, name-unique)
    async fn create_billing_profile(&self, req: BillingProfileFields) -> ApiResult<BillingProfile>;
    async fn list_billing_profiles(&self) -> ApiResult<Vec<BillingProfile>>;
    async fn update_billing_profile(
        &self,
        id: &str,
        req: BillingProfileFields,
    ) -> ApiResult<BillingProfile>;
    async fn delete_billing_profile(&self, id: &str) -> ApiResult<()>;

    // Project images
    async fn create_project_image(&self, req: CreateProjectImageRequest) -> ApiResult<Image>;
    async fn list_project_images(&self, project_id: &str) -> ApiResult<Vec<Image>>;
    async fn delete_project_image(&self, id: &str, project_id: &str) -> ApiResult<()>;

    // Read-only catalogs
    async fn list_datacenters(&self) -> ApiResult<Vec<Datacenter>>;
    async fn list_flavors(&self, project_id: &str, datacenter_id: &str) -> ApiResult<Vec<Flavor>>;
    async fn list_public_images(&self, flavor_id: &str) -> ApiResult<Vec<Image>>;
}
