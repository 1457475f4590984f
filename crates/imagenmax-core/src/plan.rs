//! Plan catalog.
//!
//! Plans are static catalog entries, not user-owned data. The catalog is
//! configuration: the default below can be replaced wholesale at start-up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Constants
// ============================================================================

/// Credits granted to a Free account on every new local calendar day.
pub const FREE_CREDITS: u64 = 10;

/// Cost of one generation on the Free plan.
pub const FREE_COST_PER_ACTION: u64 = 2;

/// Credits granted when Pro is activated.
pub const PRO_CREDITS: u64 = 3000;

/// Cost of one generation on Pro.
pub const PRO_COST_PER_ACTION: u64 = 10;

/// Credits granted when Mega is activated.
pub const MEGA_CREDITS: u64 = 10_000;

/// Cost of one generation on Mega.
pub const MEGA_COST_PER_ACTION: u64 = 20;

/// Credits granted by a Booster Pack top-up.
pub const BOOSTER_PACK_CREDITS: u64 = 1000;

/// Cost of one generation while on the Booster Pack tier.
pub const BOOSTER_PACK_COST_PER_ACTION: u64 = 30;

/// Length of a subscription window.
pub const SUBSCRIPTION_DURATION_DAYS: u32 = 30;

/// Cost applied when the active plan has no catalog entry.
pub const DEFAULT_COST_PER_ACTION: u64 = 10;

/// The closed set of plan names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanName {
    /// Free tier with a daily replenished allowance.
    Free,

    /// Monthly subscription.
    Pro,

    /// Larger monthly subscription.
    Mega,

    /// One-time credit top-up.
    BoosterPack,
}

impl PlanName {
    /// All plan names in catalog order.
    pub const ALL: [Self; 4] = [Self::Free, Self::Pro, Self::Mega, Self::BoosterPack];

    /// Whether this plan is a recurring subscription tier.
    #[must_use]
    pub const fn is_subscription(self) -> bool {
        matches!(self, Self::Pro | Self::Mega)
    }

    /// The `snake_case` key used in storage and on the wire.
    #[must_use]
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Mega => "mega",
            Self::BoosterPack => "booster_pack",
        }
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Mega => "Mega",
            Self::BoosterPack => "Booster Pack",
        })
    }
}

impl FromStr for PlanName {
    type Err = UnknownPlan;

    /// Accepts the wire key or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match folded.as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "mega" => Ok(Self::Mega),
            "boosterpack" => Ok(Self::BoosterPack),
            _ => Err(UnknownPlan(s.to_string())),
        }
    }
}

/// A plan name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan: {0}")]
pub struct UnknownPlan(pub String);

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSpec {
    /// Plan name.
    pub name: PlanName,

    /// Credits added on activation (or on each daily reset for Free).
    pub granted_credits: u64,

    /// Credits consumed per billable action.
    pub cost_per_action: u64,

    /// Length of the window opened by activation. `None` never expires.
    #[serde(default)]
    pub duration_days: Option<u32>,

    /// Display price in cents.
    #[serde(default)]
    pub price_cents: u64,

    /// External checkout link, if the plan is sold through one.
    #[serde(default)]
    pub checkout_url: Option<String>,
}

impl PlanSpec {
    /// Whether this entry is a recurring subscription tier.
    #[must_use]
    pub const fn is_subscription(&self) -> bool {
        self.name.is_subscription()
    }
}

/// The set of plans on offer plus the fallback cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCatalog {
    /// Plans in display order.
    pub plans: Vec<PlanSpec>,

    /// Cost applied when the active plan is missing from `plans`.
    #[serde(default = "default_cost_per_action")]
    pub default_cost_per_action: u64,
}

const fn default_cost_per_action() -> u64 {
    DEFAULT_COST_PER_ACTION
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            plans: vec![
                PlanSpec {
                    name: PlanName::Free,
                    granted_credits: FREE_CREDITS,
                    cost_per_action: FREE_COST_PER_ACTION,
                    duration_days: None,
                    price_cents: 0,
                    checkout_url: None,
                },
                PlanSpec {
                    name: PlanName::Pro,
                    granted_credits: PRO_CREDITS,
                    cost_per_action: PRO_COST_PER_ACTION,
                    duration_days: Some(SUBSCRIPTION_DURATION_DAYS),
                    price_cents: 5000,
                    checkout_url: None,
                },
                PlanSpec {
                    name: PlanName::Mega,
                    granted_credits: MEGA_CREDITS,
                    cost_per_action: MEGA_COST_PER_ACTION,
                    duration_days: Some(SUBSCRIPTION_DURATION_DAYS),
                    price_cents: 10_000,
                    checkout_url: None,
                },
                PlanSpec {
                    name: PlanName::BoosterPack,
                    granted_credits: BOOSTER_PACK_CREDITS,
                    cost_per_action: BOOSTER_PACK_COST_PER_ACTION,
                    duration_days: None,
                    price_cents: 2000,
                    checkout_url: None,
                },
            ],
            default_cost_per_action: DEFAULT_COST_PER_ACTION,
        }
    }
}

impl PlanCatalog {
    /// Look up a plan.
    #[must_use]
    pub fn spec(&self, name: PlanName) -> Option<&PlanSpec> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// Credits a fresh or replenished Free account starts with.
    #[must_use]
    pub fn free_grant(&self) -> u64 {
        self.spec(PlanName::Free).map_or(0, |p| p.granted_credits)
    }

    /// Cost of one billable action on the given plan.
    #[must_use]
    pub fn cost_per_action(&self, name: PlanName) -> u64 {
        self.spec(name)
            .map_or(self.default_cost_per_action, |p| p.cost_per_action)
    }

    /// Check that the catalog is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the Free plan is missing, a plan is listed twice,
    /// or the Free plan is given an expiration window.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (i, plan) in self.plans.iter().enumerate() {
            if self.plans[..i].iter().any(|p| p.name == plan.name) {
                return Err(CatalogError::DuplicatePlan(plan.name));
            }
        }

        match self.spec(PlanName::Free) {
            None => Err(CatalogError::MissingFreePlan),
            Some(free) if free.duration_days.is_some() => Err(CatalogError::ExpiringFreePlan),
            Some(_) => Ok(()),
        }
    }
}

/// Problems found by [`PlanCatalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// No Free entry, so fresh accounts have no grant.
    #[error("catalog has no free plan")]
    MissingFreePlan,

    /// The same plan appears more than once.
    #[error("plan listed twice: {0}")]
    DuplicatePlan(PlanName),

    /// The Free plan must not expire.
    #[error("free plan cannot have a duration")]
    ExpiringFreePlan,
}
