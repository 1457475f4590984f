//! Account types and ledger rules.
//!
//! Everything here is a pure transformation over an in-memory [`Account`].
//! The caller supplies the catalog and the current time; persistence is the
//! store crate's job.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::identity::Identity;
use crate::plan::{PlanCatalog, PlanName, PlanSpec};

/// Credits and plan state for one identity, or for the anonymous session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owner of the account. `None` for the anonymous session.
    pub identity: Option<Identity>,

    /// The plan currently in effect.
    pub active_plan: PlanName,

    /// Spendable balance.
    pub credits: u64,

    /// When the current plan window closes. `None` never expires.
    pub plan_expires_at: Option<DateTime<Utc>>,

    /// Local calendar date of the last Free-tier replenishment.
    pub last_free_credit_reset: Option<NaiveDate>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a Free account holding today's Free grant.
    #[must_use]
    pub fn new_free(
        identity: Option<Identity>,
        catalog: &PlanCatalog,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Self {
        Self {
            identity,
            active_plan: PlanName::Free,
            credits: catalog.free_grant(),
            plan_expires_at: None,
            last_free_credit_reset: Some(today),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is the anonymous session account.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.identity.is_none()
    }

    /// Whether the plan window has closed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.plan_expires_at.is_some_and(|expires| expires <= now)
    }

    /// Whether a subscription tier is active and unexpired at `now`.
    #[must_use]
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.active_plan.is_subscription() && !self.is_expired(now)
    }

    /// Check if the balance covers `amount`.
    #[must_use]
    pub const fn has_sufficient_credits(&self, amount: u64) -> bool {
        self.credits >= amount
    }

    /// Apply lazy expiry and daily Free replenishment.
    ///
    /// An expired plan is replaced by a fresh Free account for the same
    /// identity. A Free account gets its grant back once per local calendar
    /// day. Returns `true` when anything changed.
    pub fn normalize(
        &mut self,
        catalog: &PlanCatalog,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> bool {
        let mut changed = false;

        if self.is_expired(now) {
            let created_at = self.created_at;
            *self = Self::new_free(self.identity.take(), catalog, now, today);
            self.created_at = created_at;
            changed = true;
        }

        if self.active_plan == PlanName::Free && self.last_free_credit_reset != Some(today) {
            self.credits = catalog.free_grant();
            self.last_free_credit_reset = Some(today);
            self.updated_at = now;
            changed = true;
        }

        changed
    }

    /// Apply a purchased plan.
    ///
    /// Credits carry over only from a live, previously purchased plan; Free
    /// allowances and expired balances are dropped. A plan with a duration
    /// opens a fresh window from `now`. A top-up keeps an active subscription
    /// tier in place and otherwise becomes the active tier itself.
    ///
    /// # Errors
    ///
    /// - `LedgerError::FreePlanNotPurchasable` if `plan` is the Free tier.
    /// - `LedgerError::IdentityRequired` if the account is anonymous.
    ///
    /// The account is untouched on error.
    pub fn activate(&mut self, plan: &PlanSpec, now: DateTime<Utc>) -> Result<()> {
        if plan.name == PlanName::Free {
            return Err(LedgerError::FreePlanNotPurchasable(plan.name));
        }
        if self.identity.is_none() {
            return Err(LedgerError::IdentityRequired { plan: plan.name });
        }

        let expired = self.is_expired(now);
        let base = if expired || self.active_plan == PlanName::Free {
            0
        } else {
            self.credits
        };

        let keep_subscription = !plan.is_subscription() && self.has_active_subscription(now);

        self.credits = base.saturating_add(plan.granted_credits);
        self.plan_expires_at = match plan.duration_days {
            Some(days) => now.checked_add_signed(Duration::days(i64::from(days))),
            None if expired => None,
            None => self.plan_expires_at,
        };
        if !keep_subscription {
            self.active_plan = plan.name;
        }
        self.updated_at = now;

        Ok(())
    }

    /// Charge one billable action costing `cost`.
    ///
    /// Returns the remaining balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientCredits` if the balance is below
    /// `cost`; the account is untouched.
    pub fn deduct(&mut self, cost: u64, now: DateTime<Utc>) -> Result<u64> {
        let remaining = self
            .credits
            .checked_sub(cost)
            .ok_or(LedgerError::InsufficientCredits {
                balance: self.credits,
                required: cost,
            })?;

        self.credits = remaining;
        self.updated_at = now;
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn ada() -> Identity {
        Identity::parse("ada@example.com").unwrap()
    }

    fn account_on(plan: PlanName, credits: u64, expires: Option<DateTime<Utc>>) -> Account {
        let catalog = PlanCatalog::default();
        let mut account = Account::new_free(Some(ada()), &catalog, now(), today());
        account.active_plan = plan;
        account.credits = credits;
        account.plan_expires_at = expires;
        account
    }

    #[test]
    fn new_account_holds_free_grant() {
        let catalog = PlanCatalog::default();
        let account = Account::new_free(None, &catalog, now(), today());
        assert!(account.is_anonymous());
        assert_eq!(account.active_plan, PlanName::Free);
        assert_eq!(account.credits, 10);
        assert_eq!(account.plan_expires_at, None);
        assert_eq!(account.last_free_credit_reset, Some(today()));
    }

    #[test]
    fn five_deductions_drain_free_grant() {
        let catalog = PlanCatalog::default();
        let mut account = Account::new_free(None, &catalog, now(), today());
        let cost = catalog.cost_per_action(account.active_plan);

        for _ in 0..5 {
            account.deduct(cost, now()).unwrap();
        }
        assert_eq!(account.credits, 0);

        let err = account.deduct(cost, now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCredits {
                balance: 0,
                required: 2
            }
        ));
        assert_eq!(account.credits, 0);
    }

    #[test]
    fn deduct_succeeds_iff_balance_covers_cost() {
        for credits in 0..=12u64 {
            for cost in 0..=12u64 {
                let mut account = account_on(PlanName::Pro, credits, None);
                let result = account.deduct(cost, now());
                if credits >= cost {
                    assert_eq!(result.unwrap(), credits - cost);
                    assert_eq!(account.credits, credits - cost);
                } else {
                    assert!(result.is_err());
                    assert_eq!(account.credits, credits);
                }
            }
        }
    }

    #[test]
    fn activation_resets_expiration_window() {
        let catalog = PlanCatalog::default();
        for name in [PlanName::Pro, PlanName::Mega] {
            let spec = catalog.spec(name).unwrap();
            for prior in [None, Some(now() + Duration::days(25)), Some(now() - Duration::days(3))] {
                let mut account = account_on(PlanName::Pro, 40, prior);
                account.activate(spec, now()).unwrap();
                assert_eq!(account.plan_expires_at, Some(now() + Duration::days(30)));
                assert_eq!(account.active_plan, name);
            }
        }
    }

    #[test]
    fn booster_on_active_pro_keeps_pro() {
        let catalog = PlanCatalog::default();
        let expires = now() + Duration::days(12);
        let mut account = account_on(PlanName::Pro, 100, Some(expires));

        account
            .activate(catalog.spec(PlanName::BoosterPack).unwrap(), now())
            .unwrap();

        assert_eq!(account.active_plan, PlanName::Pro);
        assert_eq!(account.credits, 1100);
        assert_eq!(account.plan_expires_at, Some(expires));
    }

    #[test]
    fn booster_on_free_becomes_booster_tier() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Free, 10, None);

        account
            .activate(catalog.spec(PlanName::BoosterPack).unwrap(), now())
            .unwrap();

        assert_eq!(account.active_plan, PlanName::BoosterPack);
        assert_eq!(account.credits, 1000);
        assert_eq!(account.plan_expires_at, None);
    }

    #[test]
    fn booster_on_expired_pro_starts_from_zero() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Pro, 500, Some(now() - Duration::hours(1)));

        account
            .activate(catalog.spec(PlanName::BoosterPack).unwrap(), now())
            .unwrap();

        assert_eq!(account.active_plan, PlanName::BoosterPack);
        assert_eq!(account.credits, 1000);
        assert_eq!(account.plan_expires_at, None);
    }

    #[test]
    fn subscription_carries_live_balance() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::BoosterPack, 250, None);

        account
            .activate(catalog.spec(PlanName::Mega).unwrap(), now())
            .unwrap();

        assert_eq!(account.active_plan, PlanName::Mega);
        assert_eq!(account.credits, 10_250);
    }

    #[test]
    fn activating_free_is_rejected() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Pro, 100, None);
        let before = account.clone();

        let err = account
            .activate(catalog.spec(PlanName::Free).unwrap(), now())
            .unwrap_err();

        assert!(matches!(err, LedgerError::FreePlanNotPurchasable(PlanName::Free)));
        assert_eq!(account, before);
    }

    #[test]
    fn anonymous_activation_requires_identity() {
        let catalog = PlanCatalog::default();
        let mut account = Account::new_free(None, &catalog, now(), today());
        let before = account.clone();

        let err = account
            .activate(catalog.spec(PlanName::Pro).unwrap(), now())
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::IdentityRequired {
                plan: PlanName::Pro
            }
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn expired_plan_normalizes_to_free() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Pro, 500, Some(now() - Duration::days(1)));
        let created_at = account.created_at;

        assert!(account.normalize(&catalog, now(), today()));

        assert_eq!(account.active_plan, PlanName::Free);
        assert_eq!(account.credits, catalog.free_grant());
        assert_eq!(account.plan_expires_at, None);
        assert_eq!(account.identity, Some(ada()));
        assert_eq!(account.created_at, created_at);
    }

    #[test]
    fn live_plan_is_not_touched() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Mega, 777, Some(now() + Duration::days(1)));
        let before = account.clone();

        assert!(!account.normalize(&catalog, now(), today()));
        assert_eq!(account, before);
    }

    #[test]
    fn free_replenishes_once_per_day() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Free, 3, None);
        let tomorrow = today().succ_opt().unwrap();

        assert!(!account.normalize(&catalog, now(), today()));
        assert_eq!(account.credits, 3);

        assert!(account.normalize(&catalog, now() + Duration::days(1), tomorrow));
        assert_eq!(account.credits, 10);
        assert_eq!(account.last_free_credit_reset, Some(tomorrow));

        account.deduct(2, now() + Duration::days(1)).unwrap();
        assert!(!account.normalize(&catalog, now() + Duration::days(1), tomorrow));
        assert_eq!(account.credits, 8);
    }

    #[test]
    fn normalize_is_idempotent() {
        let catalog = PlanCatalog::default();
        let mut account = account_on(PlanName::Pro, 500, Some(now() - Duration::days(1)));
        account.last_free_credit_reset = None;

        account.normalize(&catalog, now(), today());
        let first = account.clone();
        assert!(!account.normalize(&catalog, now(), today()));
        assert_eq!(account, first);
    }

    #[test]
    fn account_serde_json() {
        let account = account_on(PlanName::Pro, 42, Some(now()));
        let json = serde_json::to_string(&account).unwrap();
        let parsed: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, account);

        let anonymous = Account::new_free(None, &PlanCatalog::default(), now(), today());
        let json = serde_json::to_value(&anonymous).unwrap();
        assert!(json["identity"].is_null());
        assert!(json["plan_expires_at"].is_null());
    }
}
