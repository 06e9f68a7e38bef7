//! Static subscription tier catalog.
//!
//! Built once at startup and never mutated. Prices are in minor currency
//! units (kopecks/cents) so no float money arithmetic happens anywhere.

use chrono::Duration;

use crate::{domain::TierId, Error, Result};

#[derive(Clone, Debug)]
pub struct Tier {
    pub id: TierId,
    pub title: String,
    /// Price in minor currency units.
    pub price_minor: u64,
    pub description: String,
    pub duration_days: u32,
}

impl Tier {
    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.duration_days))
    }

    /// Price formatted as a decimal string the payment API expects ("249.00").
    pub fn price_decimal(&self) -> String {
        format!("{}.{:02}", self.price_minor / 100, self.price_minor % 100)
    }
}

#[derive(Clone, Debug)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// The standard club offering: one, three and twelve months.
    pub fn standard() -> Self {
        let tier = |id: &str, title: &str, price_minor: u64, description: &str, days: u32| Tier {
            id: TierId(id.to_string()),
            title: title.to_string(),
            price_minor,
            description: description.to_string(),
            duration_days: days,
        };

        Self::new(vec![
            tier(
                "1_month",
                "1 month",
                24_900,
                "One month of club access: templates, stickers and ideas",
                30,
            ),
            tier(
                "3_months",
                "3 months",
                64_900,
                "Three months of club access plus a bonus pack",
                90,
            ),
            tier(
                "12_months",
                "12 months",
                229_000,
                "A full year of club access with all materials included",
                365,
            ),
        ])
    }

    pub fn get(&self, id: &TierId) -> Result<&Tier> {
        self.tiers
            .iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown tier: {id}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_three_tiers() {
        let catalog = TierCatalog::standard();
        assert_eq!(catalog.len(), 3);
        let month = catalog.get(&TierId("1_month".into())).unwrap();
        assert_eq!(month.duration_days, 30);
        assert_eq!(month.price_decimal(), "249.00");
    }

    #[test]
    fn unknown_tier_is_invalid_input() {
        let catalog = TierCatalog::standard();
        let err = catalog.get(&TierId("lifetime".into())).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn price_decimal_pads_minor_units() {
        let t = Tier {
            id: TierId("x".into()),
            title: "x".into(),
            price_minor: 105,
            description: String::new(),
            duration_days: 1,
        };
        assert_eq!(t.price_decimal(), "1.05");
    }
}
