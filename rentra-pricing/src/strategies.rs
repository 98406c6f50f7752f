use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rentra_fleet::Car;
use rentra_shared::Money;
use serde::{Deserialize, Serialize};

/// Inputs to a single quote computation. `as_of` is the only clock the
/// engine ever consults, so identical contexts always price identically.
#[derive(Debug, Clone)]
pub struct PricingContext<'a> {
    pub car: &'a Car,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub as_of: DateTime<Utc>,
}

impl PricingContext<'_> {
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// A labeled delta produced by one strategy.
#[derive(Debug, Clone)]
pub struct Adjustment {
    pub amount: Money,
    pub reason: String,
}

/// One pricing rule. Strategies are pure: they see the context and the
/// running total and either contribute a delta or stay silent. New rules
/// slot into the ordered list without touching the engine.
pub trait PriceAdjustment: Send + Sync {
    fn label(&self) -> &str;

    fn apply(&self, ctx: &PricingContext<'_>, running_total: Money) -> Option<Adjustment>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationThreshold {
    pub days: i64,
    pub discount_pct: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub label: String,
    pub months: Vec<u32>,
    pub surcharge_pct: i64,
}

/// Strategy parameters, loaded from app config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub duration_thresholds: Vec<DurationThreshold>,
    pub per_year_depreciation_pct: i64,
    pub max_depreciation_pct: i64,
    pub seasons: Vec<Season>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            duration_thresholds: vec![DurationThreshold {
                days: 7,
                discount_pct: 10,
            }],
            per_year_depreciation_pct: 1,
            max_depreciation_pct: 20,
            seasons: vec![Season {
                label: "Summer surcharge".to_string(),
                months: vec![6, 7, 8],
                surcharge_pct: 15,
            }],
        }
    }
}

/// Long rentals earn the steepest matching threshold discount.
pub struct DurationDiscount {
    thresholds: Vec<DurationThreshold>,
}

impl DurationDiscount {
    pub fn new(mut thresholds: Vec<DurationThreshold>) -> Self {
        thresholds.sort_by(|a, b| b.days.cmp(&a.days));
        Self { thresholds }
    }
}

impl PriceAdjustment for DurationDiscount {
    fn label(&self) -> &str {
        "duration_discount"
    }

    fn apply(&self, ctx: &PricingContext<'_>, running_total: Money) -> Option<Adjustment> {
        let rule = self
            .thresholds
            .iter()
            .find(|rule| ctx.nights() >= rule.days)?;
        if rule.discount_pct <= 0 {
            return None;
        }
        Some(Adjustment {
            amount: -running_total.percent(rule.discount_pct),
            reason: format!(
                "{}% discount for rentals of {}+ days",
                rule.discount_pct, rule.days
            ),
        })
    }
}

/// Older cars rent cheaper: a per-model-year percentage off, capped.
/// Age is measured against `as_of`, not the wall clock.
pub struct YearDepreciation {
    per_year_pct: i64,
    max_pct: i64,
}

impl YearDepreciation {
    pub fn new(per_year_pct: i64, max_pct: i64) -> Self {
        Self {
            per_year_pct,
            max_pct,
        }
    }
}

impl PriceAdjustment for YearDepreciation {
    fn label(&self) -> &str {
        "year_depreciation"
    }

    fn apply(&self, ctx: &PricingContext<'_>, running_total: Money) -> Option<Adjustment> {
        let age = (ctx.as_of.year() - ctx.car.year).max(0) as i64;
        let pct = (self.per_year_pct * age).min(self.max_pct);
        if pct <= 0 {
            return None;
        }
        Some(Adjustment {
            amount: -running_total.percent(pct),
            reason: format!("{pct}% depreciation for a {} model year", ctx.car.year),
        })
    }
}

/// Surcharge applied when the rental starts in a configured month window.
pub struct SeasonalSurcharge {
    seasons: Vec<Season>,
}

impl SeasonalSurcharge {
    pub fn new(seasons: Vec<Season>) -> Self {
        Self { seasons }
    }
}

impl PriceAdjustment for SeasonalSurcharge {
    fn label(&self) -> &str {
        "seasonal_surcharge"
    }

    fn apply(&self, ctx: &PricingContext<'_>, running_total: Money) -> Option<Adjustment> {
        let month = ctx.start_date.month();
        let season = self
            .seasons
            .iter()
            .find(|season| season.months.contains(&month) && season.surcharge_pct != 0)?;
        Some(Adjustment {
            amount: running_total.percent(season.surcharge_pct),
            reason: format!("{} ({}%)", season.label, season.surcharge_pct),
        })
    }
}
