//! Attribute validators
//!
//! Pure predicates over a single declared value. Validation only fires on
//! concrete values: `Unknown` and `Null` always pass, both as container
//! values and as list elements.

use crate::diag::{Diagnostic, Diagnostics};
use crate::value::Value;
use uuid::Uuid;

/// Checks one declared attribute value, producing diagnostics on failure.
pub trait Validator: Send + Sync {
    fn validate(&self, attribute: &str, value: &Value) -> Diagnostics;
}

/// Enum-membership validator over an immutable token set.
///
/// The set is built once during process initialization; the caller is
/// responsible for excluding any "unspecified" sentinel token.
pub struct OneOf {
    label: &'static str,
    allowed: Vec<String>,
}

impl OneOf {
    pub fn new<I, S>(label: &'static str, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

impl Validator for OneOf {
    fn validate(&self, attribute: &str, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(token) = value.as_str() else {
            return diags;
        };
        if !self.allowed.iter().any(|a| a == token) {
            diags.push(Diagnostic::attribute_error(
                attribute,
                format!("Invalid {}", self.label),
                format!(
                    "Invalid {} specified: {token}\nValid values: {:?}",
                    self.label, self.allowed
                ),
            ));
        }
        diags
    }
}

/// Single-value UUID format validator.
pub struct UuidString;

impl Validator for UuidString {
    fn validate(&self, attribute: &str, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Some(s) = value.as_str() {
            if Uuid::parse_str(s).is_err() {
                diags.push(invalid_uuid(attribute, s));
            }
        }
        diags
    }
}

/// Element-wise UUID format validator for list attributes.
///
/// Every invalid element yields its own diagnostic; the pass never
/// short-circuits.
pub struct UuidList;

impl Validator for UuidList {
    fn validate(&self, attribute: &str, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(items) = value.as_list() else {
            return diags;
        };
        for item in items {
            let Some(s) = item.as_str() else {
                // Unknown/null elements are skipped, never invalid.
                continue;
            };
            if Uuid::parse_str(s).is_err() {
                diags.push(invalid_uuid(attribute, s));
            }
        }
        diags
    }
}

fn invalid_uuid(attribute: &str, value: &str) -> Diagnostic {
    Diagnostic::attribute_error(
        attribute,
        "Invalid UUID",
        format!("The value {value:?} is not a valid UUIDv4."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "2f4e2b7a-9d3c-4a61-8c5e-0d1b2a3c4d5e";

    #[test]
    fn one_of_accepts_members_only() {
        let validator = OneOf::new("billing period", ["HOURLY", "MONTHLY"]);
        assert!(validator.validate("billing_period", &Value::string("HOURLY")).is_empty());
        let diags = validator.validate("billing_period", &Value::string("WEEKLY"));
        assert!(diags.has_errors());
        assert!(diags.iter().next().unwrap().detail.contains("WEEKLY"));
    }

    #[test]
    fn one_of_skips_unresolved_values() {
        let validator = OneOf::new("billing period", ["HOURLY"]);
        assert!(validator.validate("billing_period", &Value::Unknown).is_empty());
        assert!(validator.validate("billing_period", &Value::Null).is_empty());
    }

    #[test]
    fn uuid_string_names_the_offender() {
        let validator = UuidString;
        assert!(validator.validate("project_id", &Value::string(VALID)).is_empty());
        let diags = validator.validate("project_id", &Value::string("not-a-uuid"));
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.attribute.as_deref(), Some("project_id"));
        assert!(diag.detail.contains("\"not-a-uuid\""));
        assert!(validator.validate("project_id", &Value::Unknown).is_empty());
        assert!(validator.validate("project_id", &Value::Null).is_empty());
    }

    #[test]
    fn uuid_list_reports_each_invalid_element() {
        let validator = UuidList;
        let value = Value::List(vec![
            Value::string(VALID),
            Value::string("bad"),
            Value::string(VALID),
        ]);
        let diags = validator.validate("ssh_key_ids", &value);
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().detail.contains("\"bad\""));

        let value = Value::List(vec![Value::string("bad"), Value::string("worse")]);
        assert_eq!(validator.validate("ssh_key_ids", &value).len(), 2);
    }

    #[test]
    fn uuid_list_skips_unresolved_containers_and_elements() {
        let validator = UuidList;
        assert!(validator.validate("ssh_key_ids", &Value::Unknown).is_empty());
        assert!(validator.validate("ssh_key_ids", &Value::Null).is_empty());
        let value = Value::List(vec![Value::Unknown, Value::Null]);
        assert!(validator.validate("ssh_key_ids", &value).is_empty());
    }
}
