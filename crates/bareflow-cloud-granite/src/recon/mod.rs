//! Entity reconcilers
//!
//! One reconciler per Granite entity kind, all plugging into the
//! `bareflow-cloud` lifecycle contract. CRUD bodies are deliberately
//! uniform; the interesting pieces are node provisioning (polling, tag
//! merge) and project-image upload.

use bareflow_cloud::{Diagnostic, Diagnostics, ID_ATTR, RpcError};

pub mod billing_profile;
pub mod lookup;
pub mod node;
pub mod project;
pub mod project_image;
pub mod ssh_key;

pub use billing_profile::BillingProfileReconciler;
pub use lookup::{DatacenterLookup, FlavorLookup, ImageLookup, ProjectLookup};
pub use node::NodeReconciler;
pub use project::ProjectReconciler;
pub use project_image::ProjectImageReconciler;
pub use ssh_key::SshKeyReconciler;

/// Fatal diagnostic for a failed remote call.
fn client_error(action: &str, err: &RpcError) -> Diagnostic {
    Diagnostic::error("Client Error", format!("Unable to {action}, got error: {err}"))
}

/// Non-fatal diagnostic for deleting an object that is already absent.
fn already_absent(kind: &str, err: &RpcError) -> Diagnostic {
    Diagnostic::warning(
        "Client Warning",
        format!("{kind} that should be deleted does not exist: {err}"),
    )
}

fn missing_id(kind: &str) -> Diagnostic {
    Diagnostic::attribute_error(ID_ATTR, "Missing identifier", format!("{kind} has no resolved id"))
}

/// Accumulate a required-attribute lookup into a diagnostics list.
fn collect(result: Result<&str, Diagnostic>, diags: &mut Diagnostics) -> Option<String> {
    match result {
        Ok(value) => Some(value.to_string()),
        Err(diag) => {
            diags.push(diag);
            None
        }
    }
}
