//! The account ledger service.
//!
//! [`AccountLedger`] is constructed once at start-up and handed to whatever
//! needs balances or has to charge for an action. It owns the session's
//! identity; every read normalises the account (lazy expiry, daily Free
//! replenishment) and writes the normalised record back when it changed.

use imagenmax_core::{
    Account, Clock, Identity, LedgerError, PlanCatalog, PlanName, PlanSpec, Result, SystemClock,
};

use crate::keys;
use crate::KeyValueStore;

/// Session-scoped credits ledger over a key-value store.
pub struct AccountLedger<S, C = SystemClock> {
    store: S,
    clock: C,
    catalog: PlanCatalog,
    session: Option<Identity>,
}

impl<S: KeyValueStore, C: Clock> AccountLedger<S, C> {
    /// Open the ledger, restoring the last logged-in identity if one was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn open(store: S, clock: C, catalog: PlanCatalog) -> Result<Self> {
        let session = match store.get(keys::LAST_IDENTITY_KEY)? {
            Some(raw) => match Identity::parse(&raw) {
                Ok(identity) => {
                    tracing::info!(identity = %identity, "Restored session");
                    Some(identity)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable session identity");
                    store.remove(keys::LAST_IDENTITY_KEY)?;
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            store,
            clock,
            catalog,
            session,
        })
    }

    /// The plan catalog in effect.
    #[must_use]
    pub const fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// The identity attached to the session, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.session.as_ref()
    }

    /// Whether the session has an identity.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Load the account for `identity`, or the anonymous account for `None`.
    ///
    /// Missing or unreadable records are replaced by a fresh Free account.
    /// The result is always normalised.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn load_account(&self, identity: Option<&Identity>) -> Result<Account> {
        let now = self.clock.now();
        let today = self.clock.today();
        let key = keys::account_key_for(identity);

        let (mut account, mut dirty) = match self.read_record(&key, identity)? {
            Some(account) => (account, false),
            None => {
                tracing::debug!(key = %key, "Creating free account");
                let account = Account::new_free(identity.cloned(), &self.catalog, now, today);
                (account, true)
            }
        };

        if account.normalize(&self.catalog, now, today) {
            tracing::debug!(
                key = %key,
                plan = %account.active_plan,
                credits = account.credits,
                "Account normalised"
            );
            dirty = true;
        }

        if dirty {
            self.save_account(&account)?;
        }

        Ok(account)
    }

    /// Load the account for the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn current_account(&self) -> Result<Account> {
        self.load_account(self.session.as_ref())
    }

    /// Cost of one billable action for the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn cost_per_action(&self) -> Result<u64> {
        let account = self.current_account()?;
        Ok(self.catalog.cost_per_action(account.active_plan))
    }

    /// Check whether the current session can pay for one action.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientCredits` if it cannot, or a storage
    /// error if the store fails.
    pub fn ensure_affordable(&self) -> Result<Account> {
        let account = self.current_account()?;
        let cost = self.catalog.cost_per_action(account.active_plan);

        if account.has_sufficient_credits(cost) {
            Ok(account)
        } else {
            Err(LedgerError::InsufficientCredits {
                balance: account.credits,
                required: cost,
            })
        }
    }

    /// The catalog entry for `plan`, if it can be bought at all.
    ///
    /// Does not look at the session, so callers can reject a purchase before
    /// logging anyone in.
    ///
    /// # Errors
    ///
    /// - `LedgerError::FreePlanNotPurchasable` for the Free tier.
    /// - `LedgerError::PlanUnavailable` if the catalog does not offer `plan`.
    pub fn purchasable_plan(&self, plan: PlanName) -> Result<&PlanSpec> {
        if plan == PlanName::Free {
            return Err(LedgerError::FreePlanNotPurchasable(plan));
        }
        self.catalog
            .spec(plan)
            .ok_or(LedgerError::PlanUnavailable(plan))
    }

    /// Apply a purchased plan to the session's account and persist it.
    ///
    /// # Errors
    ///
    /// - `LedgerError::FreePlanNotPurchasable` for the Free tier.
    /// - `LedgerError::PlanUnavailable` if the catalog does not offer `plan`.
    /// - `LedgerError::IdentityRequired` if the session is anonymous; the
    ///   caller should ask for an email, log in, and retry.
    pub fn activate_plan(&mut self, plan: PlanName) -> Result<Account> {
        let spec = self.purchasable_plan(plan)?.clone();
        let identity = self
            .session
            .clone()
            .ok_or(LedgerError::IdentityRequired { plan })?;

        let mut account = self.load_account(Some(&identity))?;
        let previous_plan = account.active_plan;
        account.activate(&spec, self.clock.now())?;
        self.save_account(&account)?;

        tracing::info!(
            identity = %identity,
            purchased = %plan,
            previous_plan = %previous_plan,
            active_plan = %account.active_plan,
            credits = account.credits,
            expires_at = ?account.plan_expires_at,
            "Plan activated"
        );

        Ok(account)
    }

    /// Charge the session's account for one billable action.
    ///
    /// Call this only after the action succeeded.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientCredits` if the balance is below the
    /// active plan's cost; nothing is written in that case.
    pub fn deduct_credits(&mut self) -> Result<Account> {
        let mut account = self.current_account()?;
        let cost = self.catalog.cost_per_action(account.active_plan);

        account.deduct(cost, self.clock.now())?;
        self.save_account(&account)?;

        tracing::info!(
            identity = account.identity.as_ref().map_or("anonymous", Identity::as_str),
            plan = %account.active_plan,
            cost,
            remaining = account.credits,
            "Credits deducted"
        );

        Ok(account)
    }

    /// Attach `identity` to the session and load its account.
    ///
    /// The anonymous account is discarded, not merged.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn login(&mut self, identity: Identity) -> Result<Account> {
        self.store.set(keys::LAST_IDENTITY_KEY, identity.as_str())?;
        self.store.remove(keys::ANONYMOUS_ACCOUNT_KEY)?;
        tracing::info!(identity = %identity, "Logged in");
        self.session = Some(identity);

        self.current_account()
    }

    /// Detach the session's identity and start a fresh anonymous account.
    ///
    /// The identity's stored account is kept for a later login. An anonymous
    /// session is left as it is, balance included.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn logout(&mut self) -> Result<Account> {
        let Some(identity) = self.session.take() else {
            return self.current_account();
        };
        tracing::info!(identity = %identity, "Logged out");
        self.store.remove(keys::LAST_IDENTITY_KEY)?;

        let account = Account::new_free(None, &self.catalog, self.clock.now(), self.clock.today());
        self.save_account(&account)?;
        Ok(account)
    }

    /// Read a stored account, treating unreadable or mismatched records as missing.
    fn read_record(&self, key: &str, identity: Option<&Identity>) -> Result<Option<Account>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Account>(&raw) {
            Ok(account) if account.identity.as_ref() == identity => Ok(Some(account)),
            Ok(_) => {
                tracing::warn!(key = %key, "Stored account belongs to another identity, replacing");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt account record, replacing");
                Ok(None)
            }
        }
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        let key = keys::account_key_for(account.identity.as_ref());
        let value = serde_json::to_string(account)?;
        self.store.set(&key, &value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
    use imagenmax_core::FixedClock;
    use std::sync::Arc;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap()
    }

    fn ada() -> Identity {
        Identity::parse("ada@example.com").unwrap()
    }

    fn ledger() -> (AccountLedger<Arc<MemoryStore>, FixedClock>, Arc<MemoryStore>, FixedClock) {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(start());
        let ledger =
            AccountLedger::open(Arc::clone(&store), clock.clone(), PlanCatalog::default())
                .unwrap();
        (ledger, store, clock)
    }

    #[test]
    fn fresh_anonymous_account_scenario() {
        let (mut ledger, _store, _clock) = ledger();

        let account = ledger.current_account().unwrap();
        assert!(account.is_anonymous());
        assert_eq!(account.active_plan, PlanName::Free);
        assert_eq!(account.credits, 10);

        for _ in 0..5 {
            ledger.deduct_credits().unwrap();
        }
        assert_eq!(ledger.current_account().unwrap().credits, 0);

        let err = ledger.deduct_credits().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCredits {
                balance: 0,
                required: 2
            }
        ));
        assert_eq!(ledger.current_account().unwrap().credits, 0);
    }

    #[test]
    fn load_is_persisted_and_idempotent() {
        let (ledger, store, _clock) = ledger();

        let first = ledger.load_account(Some(&ada())).unwrap();
        let second = ledger.load_account(Some(&ada())).unwrap();
        assert_eq!(first, second);
        assert!(store.get(&keys::account_key(&ada())).unwrap().is_some());
    }

    #[test]
    fn activation_requires_identity() {
        let (mut ledger, store, _clock) = ledger();
        let before = ledger.current_account().unwrap();

        let err = ledger.activate_plan(PlanName::Pro).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::IdentityRequired {
                plan: PlanName::Pro
            }
        ));
        assert_eq!(ledger.current_account().unwrap(), before);
        assert!(store.get(keys::LAST_IDENTITY_KEY).unwrap().is_none());
    }

    #[test]
    fn activating_free_is_rejected() {
        let (mut ledger, _store, _clock) = ledger();
        ledger.login(ada()).unwrap();

        let err = ledger.activate_plan(PlanName::Free).unwrap_err();
        assert!(matches!(err, LedgerError::FreePlanNotPurchasable(PlanName::Free)));
    }

    #[test]
    fn purchasable_plan_checks_catalog_without_session() {
        let (ledger, _store, _clock) = ledger();

        assert_eq!(ledger.purchasable_plan(PlanName::Pro).unwrap().granted_credits, 3000);
        assert!(matches!(
            ledger.purchasable_plan(PlanName::Free),
            Err(LedgerError::FreePlanNotPurchasable(PlanName::Free))
        ));
        assert!(!ledger.is_logged_in());
    }

    #[test]
    fn anonymous_logout_keeps_balance() {
        let (mut ledger, _store, _clock) = ledger();
        ledger.deduct_credits().unwrap();
        ledger.deduct_credits().unwrap();

        let account = ledger.logout().unwrap();
        assert!(account.is_anonymous());
        assert_eq!(account.credits, 6);
        assert_eq!(ledger.current_account().unwrap().credits, 6);
    }

    #[test]
    fn plan_missing_from_catalog_is_unavailable() {
        let mut catalog = PlanCatalog::default();
        catalog.plans.retain(|p| p.name != PlanName::Mega);
        let mut ledger =
            AccountLedger::open(MemoryStore::new(), FixedClock::at(start()), catalog).unwrap();
        ledger.login(ada()).unwrap();

        let err = ledger.activate_plan(PlanName::Mega).unwrap_err();
        assert!(matches!(err, LedgerError::PlanUnavailable(PlanName::Mega)));
    }

    #[test]
    fn pro_then_booster_keeps_pro() {
        let (mut ledger, _store, _clock) = ledger();
        ledger.login(ada()).unwrap();

        let pro = ledger.activate_plan(PlanName::Pro).unwrap();
        assert_eq!(pro.credits, 3000);
        assert_eq!(pro.plan_expires_at, Some(start() + Duration::days(30)));

        let account = ledger.activate_plan(PlanName::BoosterPack).unwrap();
        assert_eq!(account.active_plan, PlanName::Pro);
        assert_eq!(account.credits, 4000);
        assert_eq!(account.plan_expires_at, Some(start() + Duration::days(30)));

        let deducted = ledger.deduct_credits().unwrap();
        assert_eq!(deducted.credits, 3990);
    }

    #[test]
    fn reactivation_resets_window_from_now() {
        let (mut ledger, _store, clock) = ledger();
        ledger.login(ada()).unwrap();
        ledger.activate_plan(PlanName::Pro).unwrap();

        clock.advance(Duration::days(20));
        let account = ledger.activate_plan(PlanName::Pro).unwrap();
        assert_eq!(
            account.plan_expires_at,
            Some(start() + Duration::days(20) + Duration::days(30))
        );
        assert_eq!(account.credits, 6000);
    }

    #[test]
    fn expired_pro_loads_as_free() {
        let (mut ledger, _store, clock) = ledger();
        ledger.login(ada()).unwrap();
        ledger.activate_plan(PlanName::Pro).unwrap();

        clock.advance(Duration::days(31));
        let account = ledger.current_account().unwrap();
        assert_eq!(account.active_plan, PlanName::Free);
        assert_eq!(account.credits, 10);
        assert_eq!(account.plan_expires_at, None);
        assert_eq!(account.identity, Some(ada()));
    }

    #[test]
    fn expired_record_written_by_hand_loads_as_free() {
        let (ledger, store, _clock) = ledger();
        let mut stale = Account::new_free(
            Some(ada()),
            &PlanCatalog::default(),
            start() - Duration::days(40),
            (start() - Duration::days(40)).date_naive(),
        );
        stale.active_plan = PlanName::Pro;
        stale.credits = 500;
        stale.plan_expires_at = Some(start() - Duration::days(10));
        store
            .set(&keys::account_key(&ada()), &serde_json::to_string(&stale).unwrap())
            .unwrap();

        let account = ledger.load_account(Some(&ada())).unwrap();
        assert_eq!(account.active_plan, PlanName::Free);
        assert_eq!(account.credits, 10);
    }

    #[test]
    fn free_resets_once_per_local_day() {
        let (mut ledger, _store, clock) = ledger();
        ledger.deduct_credits().unwrap();
        ledger.deduct_credits().unwrap();
        assert_eq!(ledger.current_account().unwrap().credits, 6);

        clock.advance(Duration::hours(10));
        assert_eq!(ledger.current_account().unwrap().credits, 6);

        clock.advance(Duration::hours(5));
        assert_eq!(ledger.current_account().unwrap().credits, 10);
        ledger.deduct_credits().unwrap();
        assert_eq!(ledger.current_account().unwrap().credits, 8);
        assert_eq!(ledger.current_account().unwrap().credits, 8);
    }

    #[test]
    fn reset_follows_the_callers_time_zone() {
        // 09:00 UTC on the 10th is already 00:30 on the 11th at UTC+15:30.
        let offset = FixedOffset::east_opt(15 * 3600 + 1800).unwrap();
        let clock = FixedClock::with_offset(start() - Duration::hours(1), offset);
        let mut ledger =
            AccountLedger::open(MemoryStore::new(), clock.clone(), PlanCatalog::default())
                .unwrap();

        ledger.deduct_credits().unwrap();
        assert_eq!(ledger.current_account().unwrap().credits, 8);

        clock.advance(Duration::hours(1));
        assert_eq!(ledger.current_account().unwrap().credits, 10);
    }

    #[test]
    fn login_discards_anonymous_and_logout_keeps_identity_record() {
        let (mut ledger, store, _clock) = ledger();
        ledger.deduct_credits().unwrap();

        let account = ledger.login(ada()).unwrap();
        assert_eq!(account.identity, Some(ada()));
        assert_eq!(account.credits, 10);
        assert!(store.get(keys::ANONYMOUS_ACCOUNT_KEY).unwrap().is_none());

        ledger.activate_plan(PlanName::Mega).unwrap();

        let anonymous = ledger.logout().unwrap();
        assert!(anonymous.is_anonymous());
        assert_eq!(anonymous.credits, 10);
        assert!(!ledger.is_logged_in());

        let account = ledger.login(ada()).unwrap();
        assert_eq!(account.active_plan, PlanName::Mega);
        assert_eq!(account.credits, 10_000);
    }

    #[test]
    fn session_is_restored_on_open() {
        let (mut ledger, store, clock) = ledger();
        ledger.login(ada()).unwrap();
        ledger.activate_plan(PlanName::BoosterPack).unwrap();
        drop(ledger);

        let reopened =
            AccountLedger::open(Arc::clone(&store), clock, PlanCatalog::default()).unwrap();
        assert_eq!(reopened.identity(), Some(&ada()));
        let account = reopened.current_account().unwrap();
        assert_eq!(account.active_plan, PlanName::BoosterPack);
        assert_eq!(account.credits, 1000);
    }

    #[test]
    fn unreadable_session_identity_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::LAST_IDENTITY_KEY, "not an email").unwrap();

        let ledger =
            AccountLedger::open(Arc::clone(&store), FixedClock::at(start()), PlanCatalog::default())
                .unwrap();
        assert!(!ledger.is_logged_in());
        assert!(store.get(keys::LAST_IDENTITY_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_record_is_replaced() {
        let (ledger, store, _clock) = ledger();
        store.set(&keys::account_key(&ada()), "{not json").unwrap();

        let account = ledger.load_account(Some(&ada())).unwrap();
        assert_eq!(account.active_plan, PlanName::Free);
        assert_eq!(account.credits, 10);

        let raw = store.get(&keys::account_key(&ada())).unwrap().unwrap();
        assert!(serde_json::from_str::<Account>(&raw).is_ok());
    }

    #[test]
    fn record_for_another_identity_is_replaced() {
        let (ledger, store, _clock) = ledger();
        let other = Account::new_free(
            Some(Identity::parse("eve@example.com").unwrap()),
            &PlanCatalog::default(),
            start(),
            start().date_naive(),
        );
        store
            .set(&keys::account_key(&ada()), &serde_json::to_string(&other).unwrap())
            .unwrap();

        let account = ledger.load_account(Some(&ada())).unwrap();
        assert_eq!(account.identity, Some(ada()));
    }

    #[test]
    fn ensure_affordable_reports_shortfall() {
        let (mut ledger, _store, _clock) = ledger();
        for _ in 0..5 {
            ledger.ensure_affordable().unwrap();
            ledger.deduct_credits().unwrap();
        }

        assert_eq!(ledger.cost_per_action().unwrap(), 2);
        let err = ledger.ensure_affordable().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCredits {
                balance: 0,
                required: 2
            }
        ));
    }
}
