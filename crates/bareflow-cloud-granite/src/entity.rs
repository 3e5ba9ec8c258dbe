//! Granite Cloud entity types
//!
//! Authoritative remote representations as returned by the Granite API,
//! plus the closed enumerations shared between requests and entities. Each
//! enumeration carries an `*_UNSPECIFIED` sentinel that is never a valid
//! user-facing value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingPeriod {
    #[serde(rename = "BILLING_PERIOD_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "BILLING_PERIOD_HOURLY")]
    Hourly,
    #[serde(rename = "BILLING_PERIOD_MONTHLY")]
    Monthly,
    #[serde(rename = "BILLING_PERIOD_QUARTERLY")]
    Quarterly,
    #[serde(rename = "BILLING_PERIOD_YEARLY")]
    Yearly,
}

impl BillingPeriod {
    pub const ALL: [BillingPeriod; 5] = [
        BillingPeriod::Unspecified,
        BillingPeriod::Hourly,
        BillingPeriod::Monthly,
        BillingPeriod::Quarterly,
        BillingPeriod::Yearly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BillingPeriod::Unspecified => "BILLING_PERIOD_UNSPECIFIED",
            BillingPeriod::Hourly => "BILLING_PERIOD_HOURLY",
            BillingPeriod::Monthly => "BILLING_PERIOD_MONTHLY",
            BillingPeriod::Quarterly => "BILLING_PERIOD_QUARTERLY",
            BillingPeriod::Yearly => "BILLING_PERIOD_YEARLY",
        }
    }

    /// Token lookup with protobuf semantics: unrecognized names map to the
    /// sentinel.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .unwrap_or(BillingPeriod::Unspecified)
    }

    pub fn is_unspecified(self) -> bool {
        self == BillingPeriod::Unspecified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectEnvironment {
    #[serde(rename = "PROJECT_ENVIRONMENT_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "PROJECT_ENVIRONMENT_DEVELOPMENT")]
    Development,
    #[serde(rename = "PROJECT_ENVIRONMENT_STAGING")]
    Staging,
    #[serde(rename = "PROJECT_ENVIRONMENT_PRODUCTION")]
    Production,
}

impl ProjectEnvironment {
    pub const ALL: [ProjectEnvironment; 4] = [
        ProjectEnvironment::Unspecified,
        ProjectEnvironment::Development,
        ProjectEnvironment::Staging,
        ProjectEnvironment::Production,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProjectEnvironment::Unspecified => "PROJECT_ENVIRONMENT_UNSPECIFIED",
            ProjectEnvironment::Development => "PROJECT_ENVIRONMENT_DEVELOPMENT",
            ProjectEnvironment::Staging => "PROJECT_ENVIRONMENT_STAGING",
            ProjectEnvironment::Production => "PROJECT_ENVIRONMENT_PRODUCTION",
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == name)
            .unwrap_or(ProjectEnvironment::Unspecified)
    }

    pub fn is_unspecified(self) -> bool {
        self == ProjectEnvironment::Unspecified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationType {
    #[serde(rename = "AUTHENTICATION_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "AUTHENTICATION_TYPE_SSH")]
    Ssh,
    #[serde(rename = "AUTHENTICATION_TYPE_PASSWORD")]
    Password,
}

impl AuthenticationType {
    pub const ALL: [AuthenticationType; 3] = [
        AuthenticationType::Unspecified,
        AuthenticationType::Ssh,
        AuthenticationType::Password,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AuthenticationType::Unspecified => "AUTHENTICATION_TYPE_UNSPECIFIED",
            AuthenticationType::Ssh => "AUTHENTICATION_TYPE_SSH",
            AuthenticationType::Password => "AUTHENTICATION_TYPE_PASSWORD",
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .unwrap_or(AuthenticationType::Unspecified)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub environment: ProjectEnvironment,
}

/// One network interface of a node, addresses in remote-returned order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub project_id: String,
    pub fqdn: String,
    pub flavor: Flavor,
    pub datacenter: Datacenter,
    pub image: ImageRef,
    pub billing_period: BillingPeriod,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Node {
    /// The primary address is the first address of the first interface, in
    /// remote-returned order. No other selection policy applies.
    pub fn primary_address(&self) -> Option<&str> {
        self.network_interfaces
            .first()
            .and_then(|nic| nic.addresses.first())
            .map(String::as_str)
    }
}

/// Reference to the image a node was installed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: String,
    pub name: String,
    pub key_type: String,
    pub fingerprint: Option<String>,
    pub public_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub vat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingProfile {
    pub id: String,
    pub name: String,
    pub country_code: String,
    pub state: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub billing_email: String,
    pub company: Option<Company>,
}

/// Short-lived handle for pushing image bytes after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub upload_url: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub project_id: Option<String>,
    #[serde(default)]
    pub authentication_types: Vec<AuthenticationType>,
    /// Only present on freshly registered project images.
    pub upload: Option<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: String,
    pub name: String,
    /// Short name as shown in the control panel, e.g. "fra01".
    pub short: String,
    pub region_id: String,
    pub latency_endpoint: String,
    pub server_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_tokens_round_trip() {
        for period in BillingPeriod::ALL {
            assert_eq!(BillingPeriod::from_name(period.name()), period);
        }
        assert!(BillingPeriod::from_name("WEEKLY").is_unspecified());
        assert!(ProjectEnvironment::from_name("nope").is_unspecified());
    }

    #[test]
    fn primary_address_takes_first_of_first() {
        let mut node = Node {
            id: "n1".into(),
            project_id: "p1".into(),
            fqdn: "web-1.example.com".into(),
            flavor: Flavor {
                id: "f1".into(),
                name: "xeon.2288g.128".into(),
            },
            datacenter: Datacenter {
                id: "d1".into(),
                name: "Frankfurt 1".into(),
                short: "fra01".into(),
                region_id: "r1".into(),
                latency_endpoint: "ping.fra01.example.com".into(),
                server_prefix: "fra01".into(),
            },
            image: ImageRef {
                id: "i1".into(),
                name: "debian-12".into(),
            },
            billing_period: BillingPeriod::Monthly,
            network_interfaces: Vec::new(),
            tags: BTreeMap::new(),
        };
        assert_eq!(node.primary_address(), None);

        node.network_interfaces = vec![
            NetworkInterface {
                addresses: vec!["203.0.113.7".into(), "203.0.113.8".into()],
            },
            NetworkInterface {
                addresses: vec!["10.0.0.1".into()],
            },
        ];
        assert_eq!(node.primary_address(), Some("203.0.113.7"));
    }

    #[test]
    fn wire_payloads_use_protobuf_tokens() {
        let payload = r#"{
            "id": "k1",
            "name": "ci-deploy",
            "project_id": "p1",
            "authentication_types": ["AUTHENTICATION_TYPE_SSH"],
            "upload": null
        }"#;
        let image: Image = serde_json::from_str(payload).unwrap();
        assert_eq!(image.authentication_types, vec![AuthenticationType::Ssh]);

        let period = serde_json::to_string(&BillingPeriod::Quarterly).unwrap();
        assert_eq!(period, "\"BILLING_PERIOD_QUARTERLY\"");
    }
}
