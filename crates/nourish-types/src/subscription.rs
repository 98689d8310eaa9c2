//! Subscription types
//!
//! A subscription is created `active` and then moves through a small state
//! machine:
//!
//! ```text
//!   active <──> paused
//!      │          │
//!      └──> cancelled <──┘
//! ```
//!
//! `cancelled` is terminal. Repeating a transition (`paused -> paused`) is
//! rejected rather than treated as a no-op.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, DomainError, MealPreferences, SubscriptionId, UserId};

/// Currency applied when a caller does not specify one
pub const DEFAULT_CURRENCY: &str = "INR";

/// Plan tier, determining billing period length
///
/// Unrecognized plan names are kept verbatim and billed on a one-day period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanType {
    Daily,
    Weekly,
    Monthly,
    /// A plan name this version does not know about
    Unrecognized(String),
}

impl PlanType {
    /// Length of one billing period for this plan
    pub fn duration(&self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::days(7),
            Self::Monthly => Duration::days(30),
            Self::Unrecognized(_) => Duration::days(1),
        }
    }

    /// End of the billing period that starts at `start`
    pub fn period_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.duration()
    }

    /// Whether this is one of the advertised plans
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Stored/serialized plan name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for PlanType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for PlanType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PlanType> for String {
    fn from(plan: PlanType) -> Self {
        match plan {
            PlanType::Unrecognized(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Meals are being delivered and billed
    Active,
    /// Temporarily suspended by the user
    Paused,
    /// Ended by the user; terminal
    Cancelled,
}

impl SubscriptionStatus {
    /// Stored/serialized status name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether `self -> target` is a legal transition
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Paused)
                | (Self::Paused, Self::Active)
                | (Self::Active, Self::Cancelled)
                | (Self::Paused, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            // accept the American spelling on input
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidSubscriptionStatus(s.to_string())),
        }
    }
}

/// Price in minor currency units (paise for INR)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount_minor: i64,
    pub currency: String,
}

impl Money {
    /// Create a price in the given currency
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            amount_minor,
            currency: currency.into(),
        }
    }

    /// Create a price in Indian rupees from whole rupees
    pub fn inr(rupees: u32) -> Self {
        Self::new(i64::from(rupees) * 100, DEFAULT_CURRENCY)
    }

    /// Check amount sign and currency code shape
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.amount_minor < 0 {
            return Err(DomainError::NegativeAmount(self.amount_minor));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

/// User subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Fixed at creation
    pub price: Money,
    pub delivery_address: Address,
    pub meal_preferences: MealPreferences,
    /// Advisory date for the external renewal process
    pub next_billing_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this subscription counts toward the one-active-per-user limit
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Fields a caller may change on an existing subscription
///
/// Status and price are deliberately absent; status changes go through the
/// state machine and price is fixed at creation. Unknown fields are rejected
/// on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_preferences: Option<MealPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_renew: Option<bool>,
}

impl SubscriptionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.delivery_address = Some(address);
        self
    }

    pub fn with_preferences(mut self, preferences: MealPreferences) -> Self {
        self.meal_preferences = Some(preferences);
        self
    }

    pub fn with_auto_renew(mut self, auto_renew: bool) -> Self {
        self.auto_renew = Some(auto_renew);
        self
    }

    /// True if applying this patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.delivery_address.is_none()
            && self.meal_preferences.is_none()
            && self.auto_renew.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubscriptionStatus::*;

    #[test]
    fn plan_durations() {
        assert_eq!(PlanType::Daily.duration(), Duration::days(1));
        assert_eq!(PlanType::Weekly.duration(), Duration::days(7));
        assert_eq!(PlanType::Monthly.duration(), Duration::days(30));
        assert_eq!(PlanType::from("quarterly").duration(), Duration::days(1));
    }

    #[test]
    fn plan_type_keeps_unrecognized_name() {
        let plan = PlanType::from("Quarterly");
        assert!(!plan.is_recognized());
        assert_eq!(plan.as_str(), "Quarterly");
        assert_eq!(String::from(plan), "Quarterly");
        assert_eq!(PlanType::from(" WEEKLY "), PlanType::Weekly);
    }

    #[test]
    fn plan_type_serde_as_string() {
        let json = serde_json::to_string(&PlanType::Monthly).unwrap();
        assert_eq!(json, "\"monthly\"");
        let plan: PlanType = serde_json::from_str("\"biweekly\"").unwrap();
        assert_eq!(plan, PlanType::Unrecognized("biweekly".into()));
    }

    #[test]
    fn transition_table() {
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Active.can_transition_to(Cancelled));
        assert!(Paused.can_transition_to(Cancelled));

        assert!(!Active.can_transition_to(Active));
        assert!(!Paused.can_transition_to(Paused));
        for target in [Active, Paused, Cancelled] {
            assert!(!Cancelled.can_transition_to(target));
        }
    }

    #[test]
    fn status_parsing() {
        assert_eq!("active".parse::<SubscriptionStatus>().unwrap(), Active);
        assert_eq!("Canceled".parse::<SubscriptionStatus>().unwrap(), Cancelled);
        assert!("expired".parse::<SubscriptionStatus>().is_err());
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"cancelled\"");
    }

    #[test]
    fn money_validation() {
        assert!(Money::inr(900).validate().is_ok());
        assert_eq!(Money::inr(900).amount_minor, 90_000);
        assert_eq!(Money::inr(u32::MAX).amount_minor, 429_496_729_500);
        assert_eq!(
            Money::new(-1, "INR").validate(),
            Err(DomainError::NegativeAmount(-1))
        );
        assert!(Money::new(100, "inr").validate().is_err());
        assert!(Money::new(100, "RUPEE").validate().is_err());
    }

    #[test]
    fn patch_rejects_status_and_price() {
        let smuggled = serde_json::from_str::<SubscriptionPatch>(r#"{"status":"active"}"#);
        assert!(smuggled.is_err());
        let smuggled = serde_json::from_str::<SubscriptionPatch>(
            r#"{"price":{"amount_minor":1,"currency":"INR"}}"#,
        );
        assert!(smuggled.is_err());

        let patch: SubscriptionPatch = serde_json::from_str(r#"{"auto_renew":false}"#).unwrap();
        assert_eq!(patch, SubscriptionPatch::new().with_auto_renew(false));
        assert!(SubscriptionPatch::new().is_empty());
    }
}
