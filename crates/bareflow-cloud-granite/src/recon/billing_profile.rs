//! Billing profile reconciler
//!
//! Profiles are name-unique per account. Create adopts an existing profile
//! on a name conflict the same way SSH keys do.

use crate::api::{BillingProfileFields, GraniteApi};
use crate::entity::BillingProfile;
use crate::recon::{already_absent, client_error, collect, missing_id};
use async_trait::async_trait;
use bareflow_cloud::{
    Attr, Diagnostic, Diagnostics, ID_ATTR, Model, OpContext, OpOutcome, ReadOutcome, Reconciler,
    Schema,
};
use std::sync::Arc;

const ATTRS: &[Attr] = &[
    Attr::required("name"),
    Attr::required("country_code"),
    Attr::required("state"),
    Attr::required("street"),
    Attr::required("city"),
    Attr::required("postcode"),
    Attr::required("billing_email"),
    Attr::optional("company"),
    Attr::optional("vat_id"),
    Attr::computed(ID_ATTR),
];
const SCHEMA: Schema = Schema::new(ATTRS);

pub struct BillingProfileReconciler {
    api: Arc<dyn GraniteApi>,
}

impl BillingProfileReconciler {
    pub fn new(api: Arc<dyn GraniteApi>) -> Self {
        Self { api }
    }

    async fn adopt(&self, name: &str) -> Result<Option<BillingProfile>, Diagnostic> {
        let profiles = self
            .api
            .list_billing_profiles()
            .await
            .map_err(|err| client_error("list billing profiles", &err))?;
        Ok(profiles.into_iter().find(|profile| profile.name == name))
    }
}

fn fields(declared: &Model, diags: &mut Diagnostics) -> Option<BillingProfileFields> {
    let name = collect(declared.require_str("name"), diags);
    let country_code = collect(declared.require_str("country_code"), diags);
    let state = collect(declared.require_str("state"), diags);
    let street = collect(declared.require_str("street"), diags);
    let city = collect(declared.require_str("city"), diags);
    let postcode = collect(declared.require_str("postcode"), diags);
    let billing_email = collect(declared.require_str("billing_email"), diags);
    if diags.has_errors() {
        return None;
    }
    Some(BillingProfileFields {
        name: name.unwrap_or_default(),
        country_code: country_code.unwrap_or_default(),
        state: state.unwrap_or_default(),
        street: street.unwrap_or_default(),
        city: city.unwrap_or_default(),
        postcode: postcode.unwrap_or_default(),
        billing_email: billing_email.unwrap_or_default(),
        company: declared.opt_str("company").map(str::to_string),
        vat_id: declared.opt_str("vat_id").map(str::to_string),
    })
}

fn write_billing_profile(model: &mut Model, profile: &BillingProfile) {
    model.set("name", profile.name.as_str());
    model.set("country_code", profile.country_code.as_str());
    model.set("state", profile.state.as_str());
    model.set("street", profile.street.as_str());
    model.set("city", profile.city.as_str());
    model.set("postcode", profile.postcode.as_str());
    model.set("billing_email", profile.billing_email.as_str());
    if let Some(company) = &profile.company {
        model.set("company", company.name.as_str());
        if let Some(vat_id) = company.vat_id.as_deref() {
            model.set("vat_id", vat_id);
        }
    }
    model.set(ID_ATTR, profile.id.as_str());
}

#[async_trait]
impl Reconciler for BillingProfileReconciler {
    fn kind(&self) -> &'static str {
        "granite_billing_profile"
    }

    fn schema(&self) -> &Schema {
        &SCHEMA
    }

    async fn create(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let mut diags = Diagnostics::new();
        let Some(request) = fields(&declared, &mut diags) else {
            return OpOutcome::failed(diags);
        };
        let name = request.name.clone();

        let profile = match self.api.create_billing_profile(request).await {
            Ok(profile) => profile,
            Err(err) if err.is_already_exists() => {
                tracing::info!(name = %name, "billing profile name taken, adopting");
                match self.adopt(&name).await {
                    Ok(Some(profile)) => profile,
                    Ok(None) => {
                        return OpOutcome::failed(Diagnostic::error(
                            "Client Error",
                            format!(
                                "billing profile {name:?} reported as existing but was not found"
                            ),
                        ));
                    }
                    Err(diag) => return OpOutcome::failed(diag),
                }
            }
            Err(err) => return OpOutcome::failed(client_error("create billing profile", &err)),
        };
        write_billing_profile(&mut declared, &profile);
        OpOutcome::ok(declared)
    }

    async fn read(&self, _ctx: &OpContext, mut declared: Model) -> ReadOutcome {
        let Some(id) = declared.id().map(str::to_string) else {
            return ReadOutcome::failed(missing_id("billing profile"));
        };
        let profiles = match self.api.list_billing_profiles().await {
            Ok(profiles) => profiles,
            Err(err) => return ReadOutcome::failed(client_error("list billing profiles", &err)),
        };
        match profiles.into_iter().find(|profile| profile.id == id) {
            Some(profile) => {
                write_billing_profile(&mut declared, &profile);
                ReadOutcome::Fresh(declared)
            }
            None => ReadOutcome::Gone,
        }
    }

    async fn update(&self, _ctx: &OpContext, mut declared: Model) -> OpOutcome {
        let mut diags = Diagnostics::new();
        let id = declared.id().map(str::to_string);
        if id.is_none() {
            diags.push(missing_id("billing profile"));
        }
        let Some(request) = fields(&declared, &mut diags) else {
            return OpOutcome::failed(diags);
        };
        match self
            .api
            .update_billing_profile(&id.unwrap_or_default(), request)
            .await
        {
            Ok(profile) => {
                write_billing_profile(&mut declared, &profile);
                OpOutcome::ok(declared)
            }
            Err(err) => OpOutcome::failed(client_error("update billing profile", &err)),
        }
    }

    async fn delete(&self, _ctx: &OpContext, declared: Model) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = declared.id() else {
            diags.push(missing_id("billing profile"));
            return diags;
        };
        match self.api.delete_billing_profile(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => diags.push(already_absent("Billing profile", &err)),
            Err(err) => diags.push(client_error("delete billing profile", &err)),
        }
        diags
    }
}
