use rentra_core::StoreError;
use rentra_fleet::{Car, CarDraft, CarRepository};
use rentra_shared::Money;

/// Insert a small demo fleet when the store starts empty, for local
/// development. Returns the number of cars added.
pub async fn seed_demo_fleet(cars: &dyn CarRepository) -> Result<usize, StoreError> {
    if cars.count().await? > 0 {
        return Ok(0);
    }

    let drafts = vec![
        CarDraft {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2022,
            vin: "JTDBU4EE9A9123456".into(),
            body_type: "sedan".into(),
            base_price_per_day: Money::from_major(50),
            odometer: 31_200,
            last_service_at: None,
        },
        CarDraft {
            make: "Volkswagen".into(),
            model: "Golf".into(),
            year: 2020,
            vin: "WVWZZZ1KZAW654321".into(),
            body_type: "hatchback".into(),
            base_price_per_day: Money::from_major(42),
            odometer: 58_900,
            last_service_at: None,
        },
        CarDraft {
            make: "Ford".into(),
            model: "Transit".into(),
            year: 2019,
            vin: "WF0XXXTTGXKY11223".into(),
            body_type: "van".into(),
            base_price_per_day: Money::from_major(75),
            odometer: 102_400,
            last_service_at: None,
        },
        CarDraft {
            make: "Tesla".into(),
            model: "Model 3".into(),
            year: 2023,
            vin: "5YJ3E1EA8KF332211".into(),
            body_type: "sedan".into(),
            base_price_per_day: Money::from_major(95),
            odometer: 12_000,
            last_service_at: None,
        },
    ];

    let count = drafts.len();
    for draft in drafts {
        cars.insert(Car::new(draft)).await?;
    }
    tracing::info!(count, "seeded demo fleet");
    Ok(count)
}
