//! Project image reconciler
//!
//! Create is a two-phase flow: register the image to obtain an upload
//! target, then stream the source bytes to it. A failed upload leaves the
//! registered image tracked so a later destroy can clean it up.

use crate::api::{CreateProjectImageRequest, GraniteApi};
use crate::entity::{AuthenticationType, Image};
use crate::recon::{already_absent, client_error, collect, missing_id};
use crate::transfer::ImageTransfer;
use async_trait::async_trait;
use bareflow_cloud::{
    Attr, Diagnostic, Diagnostics, ID_ATTR, Model, OpContext, OpOutcome, ReadOutcome, Reconciler,
    Schema, UuidString, Validator, Value,
};
use std::sync::Arc;

const ATTRS: &[Attr] = &[
    Attr::required("project_id"),
    Attr::required("name"),
    Attr::required("source"),
    Attr::optional("authentication_types"),
    Attr::computed(ID_ATTR),
];
const SCHEMA: Schema = Schema::new(ATTRS);

pub struct ProjectImageReconciler {
    api: Arc<dyn GraniteApi>,
    transfer: Arc<dyn ImageTransfer>,
}

impl ProjectImageReconciler {
    pub fn new(api: Arc<dyn GraniteApi>, transfer: Arc<dyn ImageTransfer>) -> Self {
        Self { api, transfer }
    }
}

fn write_image(model: &mut Model, image: &Image) {
    model.set("name", image.name.as_str());
    if let Some(project_id) = image.project_id.as_deref() {
        model.set("project_id", project_id);
    }
    if !image.authentication_types.is_empty() {
        model.set(
            "authentication_types",
            Value::string_list(image.authentication_types.iter().map(|t| t.name())),
        );
    }
    model.set(ID_ATTR, image.id.as_str());
}

#[async_trait]
impl Reconciler for ProjectImageReconciler {
    fn kind(&self) -> &'static str {
        "granite_project_image"
    }

    fn schema(&self) -> &Schema {
        &SCHEMA
    }

    fn validators(&self) -> Vec<(&'static str, &dyn Validator)> {
        vec![("project_id", &UuidString)]
    }

    async fn create(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let mut diags = Diagnostics::new();
        let project_id = collect(declared.require_str("project_id"), &mut diags);
        let name = collect(declared.require_str("name"), &mut diags);
        let source = collect(declared.require_str("source"), &mut diags);
        if diags.has_errors() {
            return OpOutcome::failed(diags);
        }

        let request = CreateProjectImageRequest {
            project_id: project_id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            authentication_types: declared
                .str_list("authentication_types")
                .iter()
                .map(|name| AuthenticationType::from_name(name))
                .collect(),
        };
        let image = match self.api.create_project_image(request).await {
            Ok(image) => image,
            Err(err) => return OpOutcome::failed(client_error("create project image", &err)),
        };
        write_image(&mut declared, &image);

        let Some(upload) = image.upload else {
            return OpOutcome::partial(
                declared,
                Diagnostic::error(
                    "Upload Error",
                    "image registration returned no upload target",
                )
                .into(),
            );
        };
        let source = source.unwrap_or_default();
        tracing::info!(id = %image.id, source = %source, "registered image, uploading");

        let body = match self.transfer.open(&source).await {
            Ok(body) => body,
            // The registered image stays tracked; only the bytes are missing.
            Err(err) => {
                return OpOutcome::partial(
                    declared,
                    Diagnostic::error("Upload Error", format!("Unable to open image source: {err}"))
                        .into(),
                );
            }
        };
        if let Err(err) = self
            .transfer
            .upload(&upload.upload_url, &upload.token, body)
            .await
        {
            return OpOutcome::partial(
                declared,
                Diagnostic::error("Upload Error", format!("Unable to upload image: {err}")).into(),
            );
        }
        OpOutcome::ok(declared)
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let Some(id) = declared.id().map(str::to_string) else {
            return ReadOutcome::failed(missing_id("project image"));
        };
        let project_id = match declared.require_str("project_id") {
            Ok(project_id) => project_id.to_string(),
            Err(diag) => return ReadOutcome::failed(diag),
        };
        let images = match self.api.list_project_images(&project_id).await {
            Ok(images) => images,
            Err(err) => return ReadOutcome::failed(client_error("list project images", &err)),
        };
        match images.into_iter().find(|image| image.id == id) {
            Some(image) => {
                write_image(&mut declared, &image);
                ReadOutcome::Fresh(declared)
            }
            None => ReadOutcome::Gone,
        }
    }

    async fn delete(&self, _ctx: &OpContext, declared: Model) -> Diagnostics {
        let mut diags = Diagnostics::new();
        // An image that never resolved a project cannot be addressed
        // remotely; there is nothing to delete.
        let Some(project_id) = declared.opt_str("project_id") else {
            return diags;
        };
        let Some(id) = declared.id() else {
            diags.push(missing_id("project image"));
            return diags;
        };
        match self.api.delete_project_image(id, project_id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => diags.push(already_absent("Project image", &err)),
            Err(err) => diags.push(client_error("delete project image", &err)),
        }
        diags
    }
}
