use chrono::{DateTime, NaiveDate, Utc};
use rentra_fleet::{Car, CarStatus};
use rentra_shared::Money;
use uuid::Uuid;

use crate::quote::{LineItem, Quote};
use crate::strategies::{
    DurationDiscount, PriceAdjustment, PricingConfig, PricingContext, SeasonalSurcharge,
    YearDepreciation,
};

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid rental range: end {end} must be after start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("car {car_id} cannot be quoted (status: {status})")]
    CarUnavailable { car_id: Uuid, status: CarStatus },
}

/// Pure quoting engine: (car, date range, as_of) → itemized quote.
/// Stateless and side-effect free, so calls may run in parallel and
/// identical inputs always produce identical quotes.
pub struct PricingEngine {
    strategies: Vec<Box<dyn PriceAdjustment>>,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        let strategies: Vec<Box<dyn PriceAdjustment>> = vec![
            Box::new(DurationDiscount::new(config.duration_thresholds)),
            Box::new(YearDepreciation::new(
                config.per_year_depreciation_pct,
                config.max_depreciation_pct,
            )),
            Box::new(SeasonalSurcharge::new(config.seasons)),
        ];
        Self { strategies }
    }

    pub fn quote(
        &self,
        car: &Car,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of: DateTime<Utc>,
    ) -> Result<Quote, PricingError> {
        if end_date <= start_date {
            return Err(PricingError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        if car.status == CarStatus::Service {
            return Err(PricingError::CarUnavailable {
                car_id: car.id,
                status: car.status,
            });
        }

        let ctx = PricingContext {
            car,
            start_date,
            end_date,
            as_of,
        };
        let nights = ctx.nights();

        let base = car.base_price_per_day.times(nights);
        let mut lines = vec![LineItem::new(
            "base",
            base,
            format!("Base rate {} x {} night(s)", car.base_price_per_day, nights),
        )];
        let mut total = base;

        for strategy in &self.strategies {
            if let Some(adjustment) = strategy.apply(&ctx, total) {
                total += adjustment.amount;
                lines.push(LineItem::new(
                    strategy.label(),
                    adjustment.amount,
                    adjustment.reason,
                ));
            }
        }

        // A quoted price never goes below zero; over-aggressive discounts
        // are brought back with an explicit floor line.
        if total.is_negative() {
            lines.push(LineItem::new(
                "floor",
                -total,
                "Adjustments clamped at a zero total",
            ));
        }

        Ok(Quote::from_lines(lines))
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::{DurationThreshold, Season};
    use chrono::TimeZone;
    use rentra_fleet::CarDraft;

    fn car_at(rate: i64, year: i32) -> Car {
        Car::new(CarDraft {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year,
            vin: format!("VIN-{rate}-{year}"),
            body_type: "sedan".into(),
            base_price_per_day: Money::from_major(rate),
            odometer: 0,
            last_service_at: None,
        })
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_three_nights_at_fifty() {
        let engine = PricingEngine::default();
        let car = car_at(50, 2024);
        let quote = engine.quote(&car, jan(1), jan(4), as_of()).unwrap();
        assert_eq!(quote.total, Money::from_major(150));
        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.lines[0].label, "base");
        assert_eq!(quote.lines[0].amount, Money::from_major(150));
    }

    #[test]
    fn test_total_equals_sum_of_lines() {
        let engine = PricingEngine::default();
        let car = car_at(80, 2018);
        let quote = engine.quote(&car, jan(1), jan(10), as_of()).unwrap();
        let sum: Money = quote.lines.iter().map(|l| l.amount).sum();
        assert_eq!(quote.total, sum);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let engine = PricingEngine::default();
        let car = car_at(65, 2019);
        let first = engine.quote(&car, jan(2), jan(12), as_of()).unwrap();
        let second = engine.quote(&car, jan(2), jan(12), as_of()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duration_discount_applies_at_seven_days() {
        let engine = PricingEngine::default();
        let car = car_at(50, 2024);
        let quote = engine.quote(&car, jan(1), jan(8), as_of()).unwrap();
        // 7 nights x 50 = 350, minus 10%
        assert_eq!(quote.total, Money::from_cents(31500));
        assert!(quote.lines.iter().any(|l| l.label == "duration_discount"));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let engine = PricingEngine::default();
        let car = car_at(50, 2024);
        assert!(matches!(
            engine.quote(&car, jan(4), jan(4), as_of()),
            Err(PricingError::InvalidRange { .. })
        ));
        assert!(matches!(
            engine.quote(&car, jan(4), jan(1), as_of()),
            Err(PricingError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_car_in_service_cannot_be_quoted() {
        let engine = PricingEngine::default();
        let mut car = car_at(50, 2024);
        car.status = CarStatus::Service;
        assert!(matches!(
            engine.quote(&car, jan(1), jan(4), as_of()),
            Err(PricingError::CarUnavailable { .. })
        ));
    }

    #[test]
    fn test_negative_total_clamped_with_floor_line() {
        let config = PricingConfig {
            duration_thresholds: vec![DurationThreshold {
                days: 1,
                discount_pct: 150,
            }],
            per_year_depreciation_pct: 0,
            max_depreciation_pct: 0,
            seasons: vec![],
        };
        let engine = PricingEngine::new(config);
        let car = car_at(50, 2024);
        let quote = engine.quote(&car, jan(1), jan(3), as_of()).unwrap();
        assert_eq!(quote.total, Money::ZERO);
        assert!(quote.lines.iter().any(|l| l.label == "floor"));
    }

    #[test]
    fn test_seasonal_surcharge_in_configured_month() {
        let config = PricingConfig {
            duration_thresholds: vec![],
            per_year_depreciation_pct: 0,
            max_depreciation_pct: 0,
            seasons: vec![Season {
                label: "Summer uplift".into(),
                months: vec![7],
                surcharge_pct: 20,
            }],
        };
        let engine = PricingEngine::new(config);
        let car = car_at(100, 2024);
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let quote = engine.quote(&car, start, end, as_of()).unwrap();
        // 300 base + 20%
        assert_eq!(quote.total, Money::from_major(360));
    }
}
