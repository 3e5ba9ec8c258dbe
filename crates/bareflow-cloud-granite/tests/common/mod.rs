//! In-memory fake of the Granite client for reconciler tests.
//!
//! Most collections behave like the real service (name conflicts, not-found
//! on absent ids). Node reads are scripted per test because readiness
//! polling depends on what each probe returns.

// Each test binary compiles its own copy; not every binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use bareflow_cloud::RpcError;
use bareflow_cloud_granite::api::{
    ApiResult, BillingProfileFields, CreateNodeRequest, CreateProjectImageRequest,
    CreateProjectRequest, CreateSshKeyRequest, GraniteApi, UpdateNodeRequest, UpdateProjectRequest,
};
use bareflow_cloud_granite::entity::{
    BillingProfile, Company, Datacenter, Flavor, Image, ImageRef, ImageUpload, Node, Project,
    SshKey,
};
use bareflow_cloud_granite::transfer::ImageTransfer;
use bareflow_cloud_granite::{GraniteError, Result};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeGranite {
    next_id: Mutex<u32>,
    pub projects: Mutex<BTreeMap<String, Project>>,
    pub ssh_keys: Mutex<Vec<SshKey>>,
    pub ssh_creates: Mutex<u32>,
    pub billing_profiles: Mutex<Vec<BillingProfile>>,
    pub project_images: Mutex<Vec<Image>>,
    pub datacenters: Mutex<Vec<Datacenter>>,
    pub flavors: Mutex<Vec<Flavor>>,
    pub public_images: Mutex<Vec<Image>>,
    /// Scripted responses for `get_node`, consumed in order. An empty
    /// script answers every probe with an internal error.
    pub node_gets: Mutex<VecDeque<ApiResult<Node>>>,
    pub node_updates: Mutex<Vec<UpdateNodeRequest>>,
    pub fail_node_update: Mutex<bool>,
}

impl FakeGranite {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{prefix}-{next}")
    }
}

/// A node fresh out of create: no addresses yet.
pub fn pending_node(id: &str, project_id: &str, fqdn: &str) -> Node {
    Node {
        id: id.to_string(),
        project_id: project_id.to_string(),
        fqdn: fqdn.to_string(),
        flavor: Flavor {
            id: "7b1f4d9a-2c3e-4f50-9a6b-8d7c6e5f4a3b".into(),
            name: "m1.small".into(),
        },
        datacenter: Datacenter {
            id: "9c2d5e8f-1a4b-4c6d-8e0f-2b3a4c5d6e7f".into(),
            name: "Frankfurt 1".into(),
            short: "fra01".into(),
            region_id: "r-eu".into(),
            latency_endpoint: "https://fra01.latency.granite.test".into(),
            server_prefix: "fra".into(),
        },
        image: ImageRef {
            id: "4e7a1b2c-3d4e-4f5a-8b9c-0d1e2f3a4b5c".into(),
            name: "debian-12".into(),
        },
        billing_period: bareflow_cloud_granite::BillingPeriod::Hourly,
        network_interfaces: Vec::new(),
        tags: BTreeMap::new(),
    }
}

/// The same node once the remote side published its address.
pub fn ready_node(id: &str, project_id: &str, fqdn: &str, address: &str) -> Node {
    let mut node = pending_node(id, project_id, fqdn);
    node.network_interfaces = vec![bareflow_cloud_granite::NetworkInterface {
        addresses: vec![address.to_string()],
    }];
    node
}

#[async_trait]
impl GraniteApi for FakeGranite {
    async fn create_project(&self, req: CreateProjectRequest) -> ApiResult<Project> {
        let project = Project {
            id: self.id("proj"),
            name: req.name,
            description: req.description,
            environment: req.environment,
        };
        self.projects
            .lock()
            .unwrap()
            .insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> ApiResult<Project> {
        self.projects
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RpcError::not_found(format!("project {id}")))
    }

    async fn update_project(&self, req: UpdateProjectRequest) -> ApiResult<Project> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&req.id)
            .ok_or_else(|| RpcError::not_found(format!("project {}", req.id)))?;
        project.name = req.name;
        project.description = req.description;
        project.environment = req.environment;
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> ApiResult<()> {
        self.projects
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RpcError::not_found(format!("project {id}")))
    }

    async fn create_node(&self, req: CreateNodeRequest) -> ApiResult<Vec<Node>> {
        let fqdn = req.fqdns.first().cloned().unwrap_or_default();
        Ok(vec![pending_node(
            &self.id("node"),
            &req.project_id,
            &fqdn,
        )])
    }

    async fn get_node(&self, id: &str, _project_id: &str) -> ApiResult<Node> {
        self.node_gets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::internal(format!("node {id} not ready"))))
    }

    async fn update_node(&self, req: UpdateNodeRequest) -> ApiResult<Node> {
        self.node_updates.lock().unwrap().push(req.clone());
        if *self.fail_node_update.lock().unwrap() {
            return Err(RpcError::internal("tag service unavailable"));
        }
        let mut node = ready_node(&req.id, &req.project_id, &req.fqdn, "203.0.113.10");
        node.tags = req.tags;
        Ok(node)
    }

    /// Nodes are never stored; destroying one always reports absence.
    async fn destroy_node(&self, id: &str, _project_id: &str) -> ApiResult<()> {
        Err(RpcError::not_found(format!("node {id}")))
    }

    async fn create_ssh_key(&self, req: CreateSshKeyRequest) -> ApiResult<SshKey> {
        *self.ssh_creates.lock().unwrap() += 1;
        let mut keys = self.ssh_keys.lock().unwrap();
        if keys.iter().any(|key| key.name == req.name) {
            return Err(RpcError::already_exists(format!("ssh key {}", req.name)));
        }
        let key = SshKey {
            id: self.id("key"),
            name: req.name,
            key_type: "ssh-ed25519".into(),
            fingerprint: Some("SHA256:fakefingerprint".into()),
            public_key: req.public_key,
        };
        keys.push(key.clone());
        Ok(key)
    }

    async fn list_ssh_keys(&self) -> ApiResult<Vec<SshKey>> {
        Ok(self.ssh_keys.lock().unwrap().clone())
    }

    async fn delete_ssh_key(&self, id: &str) -> ApiResult<()> {
        let mut keys = self.ssh_keys.lock().unwrap();
        let before = keys.len();
        keys.retain(|key| key.id != id);
        if keys.len() == before {
            return Err(RpcError::not_found(format!("ssh key {id}")));
        }
        Ok(())
    }

    async fn create_billing_profile(&self, req: BillingProfileFields) -> ApiResult<BillingProfile> {
        let mut profiles = self.billing_profiles.lock().unwrap();
        if profiles.iter().any(|profile| profile.name == req.name) {
            return Err(RpcError::already_exists(format!(
                "billing profile {}",
                req.name
            )));
        }
        let profile = BillingProfile {
            id: self.id("bill"),
            name: req.name,
            country_code: req.country_code,
            state: req.state,
            street: req.street,
            city: req.city,
            postcode: req.postcode,
            billing_email: req.billing_email,
            company: req.company.map(|name| Company {
                name,
                vat_id: req.vat_id,
            }),
        };
        profiles.push(profile.clone());
        Ok(profile)
    }

    async fn list_billing_profiles(&self) -> ApiResult<Vec<BillingProfile>> {
        Ok(self.billing_profiles.lock().unwrap().clone())
    }

    async fn update_billing_profile(
        &self,
        id: &str,
        req: BillingProfileFields,
    ) -> ApiResult<BillingProfile> {
        let mut profiles = self.billing_profiles.lock().unwrap();
        let profile = profiles
            .iter_mut()
            .find(|profile| profile.id == id)
            .ok_or_else(|| RpcError::not_found(format!("billing profile {id}")))?;
        profile.name = req.name;
        profile.country_code = req.country_code;
        profile.state = req.state;
        profile.street = req.street;
        profile.city = req.city;
        profile.postcode = req.postcode;
        profile.billing_email = req.billing_email;
        profile.company = req.company.map(|name| Company {
            name,
            vat_id: req.vat_id,
        });
        Ok(profile.clone())
    }

    async fn delete_billing_profile(&self, id: &str) -> ApiResult<()> {
        let mut profiles = self.billing_profiles.lock().unwrap();
        let before = profiles.len();
        profiles.retain(|profile| profile.id != id);
        if profiles.len() == before {
            return Err(RpcError::not_found(format!("billing profile {id}")));
        }
        Ok(())
    }

    async fn create_project_image(&self, req: CreateProjectImageRequest) -> ApiResult<Image> {
        let image = Image {
            id: self.id("img"),
            name: req.name,
            project_id: Some(req.project_id),
            authentication_types: req.authentication_types,
            upload: Some(ImageUpload {
                upload_url: "https://upload.granite.test/slot-1".into(),
                token: "upload-token-1".into(),
            }),
        };
        self.project_images.lock().unwrap().push(image.clone());
        Ok(image)
    }

    async fn list_project_images(&self, project_id: &str) -> ApiResult<Vec<Image>> {
        Ok(self
            .project_images
            .lock()
            .unwrap()
            .iter()
            .filter(|image| image.project_id.as_deref() == Some(project_id))
            .cloned()
            .collect())
    }

    async fn delete_project_image(&self, id: &str, _project_id: &str) -> ApiResult<()> {
        let mut images = self.project_images.lock().unwrap();
        let before = images.len();
        images.retain(|image| image.id != id);
        if images.len() == before {
            return Err(RpcError::not_found(format!("image {id}")));
        }
        Ok(())
    }

    async fn list_datacenters(&self) -> ApiResult<Vec<Datacenter>> {
        Ok(self.datacenters.lock().unwrap().clone())
    }

    async fn list_flavors(&self, _project_id: &str, _datacenter_id: &str) -> ApiResult<Vec<Flavor>> {
        Ok(self.flavors.lock().unwrap().clone())
    }

    async fn list_public_images(&self, _flavor_id: &str) -> ApiResult<Vec<Image>> {
        Ok(self.public_images.lock().unwrap().clone())
    }
}

/// Transfer fake: records upload targets, optionally fails the push.
#[derive(Default)]
pub struct FakeTransfer {
    pub fail_upload: bool,
    pub uploads: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ImageTransfer for FakeTransfer {
    async fn open(&self, source: &str) -> Result<reqwest::Body> {
        Ok(reqwest::Body::from(source.as_bytes().to_vec()))
    }

    async fn upload(&self, url: &str, token: &str, _body: reqwest::Body) -> Result<()> {
        if self.fail_upload {
            return Err(GraniteError::UploadStatus(
                reqwest::StatusCode::FORBIDDEN,
            ));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((url.to_string(), token.to_string()));
        Ok(())
    }
}
