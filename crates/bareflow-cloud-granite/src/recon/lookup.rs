//! Read-only catalog lookups
//!
//! These kinds resolve operator-supplied filters (a datacenter short name, a
//! flavor name) to remote identifiers. They never mutate anything: only Read
//! is implemented, the mutating defaults reject, and a filter that matches
//! nothing resolves to Gone like any other absent object.

use crate::api::GraniteApi;
use crate::recon::client_error;
use async_trait::async_trait;
use bareflow_cloud::{
    Attr, ID_ATTR, Model, OpContext, ReadOutcome, Reconciler, Schema, UuidString, Validator, Value,
};
use std::sync::Arc;

const DATACENTER_ATTRS: &[Attr] = &[
    Attr::required("short"),
    Attr::computed("name"),
    Attr::computed("region_id"),
    Attr::computed("latency_endpoint"),
    Attr::computed("server_prefix"),
    Attr::computed(ID_ATTR),
];
const DATACENTER_SCHEMA: Schema = Schema::lookup(DATACENTER_ATTRS);

/// Resolves a datacenter by its short name, case-insensitively.
pub struct DatacenterLookup {
    api: Arc<dyn GraniteApi>,
}

impl DatacenterLookup {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Reconciler for DatacenterLookup {
    fn kind(&self) -> &'static str {
        "granite_datacenter"
    }

    fn schema(&self) -> &Schema {
        &DATACENTER_SCHEMA
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let short = match declared.require_str("short") {
            Ok(short) => short.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let datacenters = match self.api.list_datacenters().await {
            Ok(datacenters) => datacenters,
            Err(err) => return ReadOutcome::failed(client_error("list datacenters", &err)),
        };
        match datacenters
            .into_iter()
            .find(|dc| dc.short.eq_ignore_ascii_case(&short))
        {
            Some(dc) => {
                declared.set("name", dc.name.as_str());
                declared.set("region_id", dc.region_id.as_str());
                declared.set("latency_endpoint", dc.latency_endpoint.as_str());
                declared.set("server_prefix", dc.server_prefix.as_str());
                declared.set(ID_ATTR, dc.id.as_str());
                ReadOutcome::Fresh(declared)
            }
            None => ReadOutcome::Gone,
        }
    }
}

const FLAVOR_ATTRS: &[Attr] = &[
    Attr::required("name"),
    Attr::required("project_id"),
    Attr::required("datacenter_id"),
    Attr::computed(ID_ATTR),
];
const FLAVOR_SCHEMA: Schema = Schema::lookup(FLAVOR_ATTRS);

/// Resolves a flavor by name, case-insensitively, within one project and
/// datacenter.
pub struct FlavorLookup {
    api: Arc<dyn GraniteApi>,
}

impl FlavorLookup {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Reconciler for FlavorLookup {
    fn kind(&self) -> &'static str {
        "granite_flavor"
    }

    fn schema(&self) -> &Schema {
        &FLAVOR_SCHEMA
    }

    fn validators(&self) -> Vec<(&'static str, &dyn Validator)> {
        vec![("project_id", &UuidString), ("datacenter_id", &UuidString)]
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let name = match declared.require_str("name") {
            Ok(name) => name.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let project_id = match declared.require_str("project_id") {
            Ok(project_id) => project_id.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let datacenter_id = match declared.require_str("datacenter_id") {
            Ok(datacenter_id) => datacenter_id.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let flavors = match self.api.list_flavors(&project_id, &datacenter_id).await {
            Ok(flavors) => flavors,
            Err(err) => return ReadOutcome::failed(client_error("list flavors", &err)),
        };
        match flavors
            .into_iter()
            .find(|flavor| flavor.name.eq_ignore_ascii_case(&name))
        {
            Some(flavor) => {
                declared.set("name", flavor.name.as_str());
                declared.set(ID_ATTR, flavor.id.as_str());
                ReadOutcome::Fresh(declared)
            }
            None => ReadOutcome::Gone,
        }
    }
}

const IMAGE_ATTRS: &[Attr] = &[
    Attr::required("name"),
    Attr::required("flavor_id"),
    Attr::computed("authentication_types"),
    Attr::computed(ID_ATTR),
];
const IMAGE_SCHEMA: Schema = Schema::lookup(IMAGE_ATTRS);

/// Resolves a public image by exact name within one flavor's catalog.
pub struct ImageLookup {
    api: Arc<dyn GraniteApi>,
}

impl ImageLookup {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Reconciler for ImageLookup {
    fn kind(&self) -> &'static str {
        "granite_image"
    }

    fn schema(&self) -> &Schema {
        &IMAGE_SCHEMA
    }

    fn validators(&self) -> Vec<(&'static str, &dyn Validator)> {
        vec![("flavor_id", &UuidString)]
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let name = match declared.require_str("name") {
            Ok(name) => name.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let flavor_id = match declared.require_str("flavor_id") {
            Ok(flavor_id) => flavor_id.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let images = match self.api.list_public_images(&flavor_id).await {
            Ok(images) => images,
            Err(err) => return ReadOutcome::failed(client_error("list public images", &err)),
        };
        match images.into_iter().find(|image| image.name == name) {
            Some(image) => {
                declared.set(
                    "authentication_types",
                    Value::string_list(image.authentication_types.iter().map(|t| t.name())),
                );
                declared.set(ID_ATTR, image.id.as_str());
                ReadOutcome::Fresh(declared)
            }
            None => ReadOutcome::Gone,
        }
    }
}

const PROJECT_ATTRS: &[Attr] = &[
    Attr::required(ID_ATTR),
    Attr::computed("name"),
    Attr::computed("description"),
    Attr::computed("environment"),
];
const PROJECT_SCHEMA: Schema = Schema::lookup(PROJECT_ATTRS);

/// Resolves an existing project by identifier without managing it.
pub struct ProjectLookup {
    api: Arc<dyn GraniteApi>,
}

impl ProjectLookup {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Reconciler for ProjectLookup {
    fn kind(&self) -> &'static str {
        "granite_project_lookup"
    }

    fn schema(&self) -> &Schema {
        &PROJECT_SCHEMA
    }

    fn validators(&self) -> Vec<(&'static str, &dyn Validator)> {
        vec![(ID_ATTR, &UuidString)]
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let id = match declared.require_str(ID_ATTR) {
            Ok(id) => id.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        match self.api.get_project(&id).await {
            Ok(project) => {
                declared.set("name", project.name.as_str());
                declared.set("description", project.description.as_str());
                declared.set("environment", project.environment.name());
                ReadOutcome::Fresh(declared)
            }
            Err(err) if err.is_not_found() => ReadOutcome::Gone,
            Err(err) => ReadOutcome::failed(client_error("get project", &err)),
        }
    }
}
