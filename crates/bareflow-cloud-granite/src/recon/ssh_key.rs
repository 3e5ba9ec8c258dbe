//! SSH key reconciler
//!
//! Keys are immutable remotely, so Update stays unsupported. Create adopts
//! an existing key when the remote side reports a name conflict, which makes
//! re-applying the same declaration idempotent.

use crate::api::{CreateSshKeyRequest, GraniteApi};
use crate::entity::SshKey;
use crate::recon::{already_absent, client_error, collect, missing_id};
use async_trait::async_trait;
use bareflow_cloud::{
    Attr, Diagnostic, Diagnostics, ID_ATTR, Model, OpContext, OpOutcome, ReadOutcome, Reconciler,
    Schema,
};
use std::sync::Arc;

const ATTRS: &[Attr] = &[
    Attr::required("name"),
    Attr::required("public_key"),
    Attr::computed("key_type"),
    Attr::computed("fingerprint"),
    Attr::computed(ID_ATTR),
];
const SCHEMA: Schema = Schema::new(ATTRS);

pub struct SshKeyReconciler {
    api: Arc<dyn GraniteApi>,
}

impl SshKeyReconciler {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }

    /// A name conflict means the key already exists remotely. Find it by
    /// name and treat it as ours.
    async fn adopt(&self, name: &str) -> Result<Option<SshKey>, Diagnostic> {
        let keys = self
            .api
            .list_ssh_keys()
            .await
            .map_err(|err| client_error("list ssh keys", &err))?;
        Ok(keys.into_iter().find(|key| key.name == name))
    }
}

fn write_ssh_key(model: &mut Model, key: &SshKey) {
    model.set("name", key.name.as_str());
    model.set("public_key", key.public_key.as_str());
    model.set("key_type", key.key_type.as_str());
    if let Some(fingerprint) = key.fingerprint.as_deref() {
        model.set("fingerprint", fingerprint);
    }
    model.set(ID_ATTR, key.id.as_str());
}

#[async_trait]
impl Reconciler for SshKeyReconciler {
    fn kind(&self) -> &'static str {
        "granite_sshkey"
    }

    fn schema(&self) -> &Schema {
        &SCHEMA
    }

    async fn create(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let mut diags = Diagnostics::new();
        let name = collect(declared.require_str("name"), &mut diags);
        let public_key = collect(declared.require_str("public_key"), &mut diags);
        if diags.has_errors() {
            return OpOutcome::failed(diags);
        }
        let name = name.unwrap_or_default();

        let request = CreateSshKeyRequest {
            name: name.clone(),
            public_key: public_key.unwrap_or_default(),
        };
        let key = match self.api.create_ssh_key(request).await {
            Ok(key) => key,
            Err(err) if err.is_already_exists() => {
                tracing::info!(name = %name, "ssh key name taken, adopting existing key");
                match self.adopt(&name).await {
                    Ok(Some(key)) => key,
                    Ok(None) => {
                        return OpOutcome::failed(Diagnostic::error(
                            "Client Error",
                            format!("ssh key {name:?} reported as existing but was not found"),
                        ));
                    }
                    Err(diag) => return OpOutcome::failed(diag),
                }
            }
            Err(err) => return OpOutcome::failed(client_error("create ssh key", &err)),
        };
        write_ssh_key(&mut declared, &key);
        OpOutcome::ok(declared)
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let Some(id) = declared.id().map(str::to_string) else {
            return ReadOutcome::failed(missing_id("ssh key"));
        };
        let keys = match self.api.list_ssh_keys().await {
            Ok(keys) => keys,
            Err(err) => return ReadOutcome::failed(client_error("list ssh keys", &err)),
        };
        match keys.into_iter().find(|key| key.id == id) {
            Some(key) => {
                write_ssh_key(&mut declared, &key);
                ReadOutcome::Fresh(declared)
            }
            None => ReadOutcome::Gone,
        }
    }

    async fn delete(&self, _ctx: &OpContext, declared: Model) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = declared.id() else {
            diags.push(missing_id("ssh key"));
            return diags;
        };
        match self.api.delete_ssh_key(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => diags.push(already_absent("SSH key", &err)),
            Err(err) => diags.push(client_error("delete ssh key", &err)),
        }
        diags
    }
}
