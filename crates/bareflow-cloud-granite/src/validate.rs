//! Granite enum validators
//!
//! Token sets are derived from the entity enumerations once during
//! process-wide initialization and shared by reference; the sentinel
//! `*_UNSPECIFIED` member is never part of the valid set.

use crate::entity::{BillingPeriod, ProjectEnvironment};
use bareflow_cloud::OneOf;
use std::sync::LazyLock;

static BILLING_PERIOD: LazyLock<OneOf> = LazyLock::new(|| {
    OneOf::new(
        "billing period",
        BillingPeriod::ALL
            .into_iter()
            .filter(|p| !p.is_unspecified())
            .map(BillingPeriod::name),
    )
});

static PROJECT_ENVIRONMENT: LazyLock<OneOf> = LazyLock::new(|| {
    OneOf::new(
        "project environment",
        ProjectEnvironment::ALL
            .into_iter()
            .filter(|e| !e.is_unspecified())
            .map(ProjectEnvironment::name),
    )
});

pub fn billing_period() -> &'static OneOf {
    &BILLING_PERIOD
}

pub fn project_environment() -> &'static OneOf {
    &PROJECT_ENVIRONMENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use bareflow_cloud::{Validator, Value};

    #[test]
    fn every_non_sentinel_billing_period_passes() {
        let validator = billing_period();
        for period in BillingPeriod::ALL {
            let diags = validator.validate("billing_period", &Value::string(period.name()));
            assert_eq!(diags.has_errors(), period.is_unspecified(), "{}", period.name());
        }
    }

    #[test]
    fn every_non_sentinel_environment_passes() {
        let validator = project_environment();
        for env in ProjectEnvironment::ALL {
            let diags = validator.validate("environment", &Value::string(env.name()));
            assert_eq!(diags.has_errors(), env.is_unspecified(), "{}", env.name());
        }
    }

    #[test]
    fn unresolved_values_pass_silently() {
        assert!(billing_period().validate("billing_period", &Value::Unknown).is_empty());
        assert!(project_environment().validate("environment", &Value::Null).is_empty());
    }
}
