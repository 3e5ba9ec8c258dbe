//! Project reconciler

use crate::api::{CreateProjectRequest, GraniteApi, UpdateProjectRequest};
use crate::entity::{Project, ProjectEnvironment};
use crate::recon::{already_absent, client_error, collect, missing_id};
use crate::validate;
use async_trait::async_trait;
use bareflow_cloud::{
    Attr, Diagnostics, ID_ATTR, Model, OpContext, OpOutcome, ReadOutcome, Reconciler, Schema,
    Validator,
};
use std::sync::Arc;

const ATTRS: &[Attr] = &[
    Attr::required("name"),
    Attr::required("description"),
    Attr::required("environment"),
    Attr::computed(ID_ATTR),
];
const SCHEMA: Schema = Schema::new(ATTRS);

pub struct ProjectReconciler {
    api: Arc<dyn GraniteApi>,
}

impl ProjectReconciler {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }
}

fn write_project(model: &mut Model, project: &Project) {
    model.set(ID_ATTR, project.id.as_str());
    model.set("name", project.name.as_str());
    model.set("environment", project.environment.name());
    if !project.description.is_empty() {
        model.set("description", project.description.as_str());
    }
}

#[async_trait]
impl Reconciler for ProjectReconciler {
    fn kind(&self) -> &'static str {
        "granite_project"
    }

    fn schema(&self) -> &Schema {
        &SCHEMA
    }

    fn validators(&self) -> Vec<(&'static str, &dyn Validator)> {
        vec![("environment", validate::project_environment())]
    }

    async fn create(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let request = match project_request(&declared) {
            Ok(request) => request,
            Err(diags) => return OpOutcome::failed(diags),
        };

        match self.api.create_project(request).await {
            Ok(project) => {
                write_project(&mut declared, &project);
                tracing::info!(id = %project.id, "created project");
                OpOutcome::ok(declared)
            }
            Err(err) => OpOutcome::failed(client_error("create project", &err)),
        }
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let Some(id) = declared.id().map(str::to_string) else {
            return ReadOutcome::failed(missing_id("project"));
        };
        match self.api.get_project(&id).await {
            Ok(project) => {
                write_project(&mut declared, &project);
                ReadOutcome::Fresh(declared)
            }
            Err(err) if err.is_not_found() => ReadOutcome::Gone,
            Err(err) => ReadOutcome::failed(client_error("get project", &err)),
        }
    }

    async fn update(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let Some(id) = declared.id().map(str::to_string) else {
            return OpOutcome::failed(missing_id("project"));
        };
        let request = match project_request(&declared) {
            Ok(request) => request,
            Err(diags) => return OpOutcome::failed(diags),
        };
        let request = UpdateProjectRequest {
            id,
            name: request.name,
            description: request.description,
            environment: request.environment,
        };

        match self.api.update_project(request).await {
            Ok(project) => {
                write_project(&mut declared, &project);
                tracing::info!(id = %project.id, "updated project");
                OpOutcome::ok(declared)
            }
            Err(err) => OpOutcome::failed(client_error("update project", &err)),
        }
    }

    async fn delete(&self, _ctx: &OpContext, declared: Model) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = declared.id() else {
            diags.push(missing_id("project"));
            return diags;
        };
        match self.api.delete_project(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => diags.push(already_absent("Project", &err)),
            Err(err) => diags.push(client_error("delete project", &err)),
        }
        diags
    }
}

fn project_request(declared: &Model) -> Result<CreateProjectRequest, Diagnostics> {
    let mut diags = Diagnostics::new();
    let name = collect(declared.require_str("name"), &mut diags);
    let description = collect(declared.require_str("description"), &mut diags);
    let environment = collect(declared.require_str("environment"), &mut diags);
    if diags.has_errors() {
        return Err(diags);
    }
    Ok(CreateProjectRequest {
        name: name.unwrap_or_default(),
        description: description.unwrap_or_default(),
        environment: ProjectEnvironment::from_name(&environment.unwrap_or_default()),
    })
}

