//! Credit purchase plans.
//!
//! The plan table is fixed: each tier maps to a `(credits, price)` pair.
//! Prices are in whole currency units; the gateway layer converts to minor
//! units where required.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Basic plan credit bundle.
pub const BASIC_PLAN_CREDITS: i64 = 100;
/// Basic plan price.
pub const BASIC_PLAN_PRICE: i64 = 50;

/// Advanced plan credit bundle.
pub const ADVANCED_PLAN_CREDITS: i64 = 500;
/// Advanced plan price.
pub const ADVANCED_PLAN_PRICE: i64 = 200;

/// Business plan credit bundle.
pub const BUSINESS_PLAN_CREDITS: i64 = 5000;
/// Business plan price.
pub const BUSINESS_PLAN_PRICE: i64 = 1000;

/// Available credit purchase plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanTier {
    /// 100 credits for 50.
    Basic,
    /// 500 credits for 200.
    Advanced,
    /// 5000 credits for 1000.
    Business,
}

impl PlanTier {
    /// Credits granted when a purchase of this plan settles.
    #[must_use]
    pub const fn credit_amount(&self) -> i64 {
        match self {
            Self::Basic => BASIC_PLAN_CREDITS,
            Self::Advanced => ADVANCED_PLAN_CREDITS,
            Self::Business => BUSINESS_PLAN_CREDITS,
        }
    }

    /// Price charged for this plan.
    #[must_use]
    pub const fn price_amount(&self) -> i64 {
        match self {
            Self::Basic => BASIC_PLAN_PRICE,
            Self::Advanced => ADVANCED_PLAN_PRICE,
            Self::Business => BUSINESS_PLAN_PRICE,
        }
    }

    /// Plan name as exposed to clients.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Advanced => "Advanced",
            Self::Business => "Business",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Basic" => Ok(Self::Basic),
            "Advanced" => Ok(Self::Advanced),
            "Business" => Ok(Self::Business),
            other => Err(PlanError::UnknownPlan(other.to_string())),
        }
    }
}

/// Errors that can occur when resolving a plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The plan name is not in the fixed enumeration.
    #[error("unknown plan: {0}")]
    UnknownPlan(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_table() {
        assert_eq!(PlanTier::Basic.credit_amount(), 100);
        assert_eq!(PlanTier::Basic.price_amount(), 50);
        assert_eq!(PlanTier::Advanced.credit_amount(), 500);
        assert_eq!(PlanTier::Advanced.price_amount(), 200);
        assert_eq!(PlanTier::Business.credit_amount(), 5000);
        assert_eq!(PlanTier::Business.price_amount(), 1000);
    }

    #[test]
    fn plan_from_str() {
        assert_eq!("Advanced".parse::<PlanTier>().unwrap(), PlanTier::Advanced);
        assert!(matches!(
            "Gold".parse::<PlanTier>(),
            Err(PlanError::UnknownPlan(name)) if name == "Gold"
        ));
        // Case-sensitive, matching the client contract.
        assert!("basic".parse::<PlanTier>().is_err());
    }
}
