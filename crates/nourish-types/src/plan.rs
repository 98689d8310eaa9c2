//! Advertised subscription plans

use serde::Serialize;

use crate::{Money, PlanType, DEFAULT_CURRENCY};

/// A plan as shown to customers before purchase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOffer {
    pub id: PlanType,
    pub name: &'static str,
    pub description: &'static str,
    pub price: Money,
    pub features: &'static [&'static str],
}

impl PlanType {
    /// List price in paise, if this is an advertised plan
    pub const fn list_price_minor(&self) -> Option<i64> {
        match self {
            Self::Daily => Some(15_000),
            Self::Weekly => Some(90_000),
            Self::Monthly => Some(350_000),
            Self::Unrecognized(_) => None,
        }
    }

    /// List price in the default currency, if this is an advertised plan
    pub fn list_price(&self) -> Option<Money> {
        self.list_price_minor()
            .map(|amount| Money::new(amount, DEFAULT_CURRENCY))
    }

    /// Features bundled with this plan
    pub const fn features(&self) -> &'static [&'static str] {
        match self {
            Self::Daily => &["flexible_ordering", "daily_menu_selection", "free_delivery"],
            Self::Weekly => &[
                "seven_days_of_meals",
                "ten_percent_discount",
                "priority_delivery",
                "menu_customization",
            ],
            Self::Monthly => &[
                "thirty_days_of_meals",
                "twenty_percent_discount",
                "priority_delivery",
                "full_menu_customization",
                "free_pause_resume",
            ],
            Self::Unrecognized(_) => &[],
        }
    }
}

/// The advertised plan catalog, shortest period first
pub fn catalog() -> Vec<PlanOffer> {
    [
        (PlanType::Daily, "Daily Plan", "Order meals day by day"),
        (PlanType::Weekly, "Weekly Plan", "7-day meal subscription"),
        (PlanType::Monthly, "Monthly Plan", "30-day meal subscription"),
    ]
    .into_iter()
    .filter_map(|(plan, name, description)| {
        Some(PlanOffer {
            price: plan.list_price()?,
            features: plan.features(),
            id: plan,
            name,
            description,
        })
    })
    .collect()
}
