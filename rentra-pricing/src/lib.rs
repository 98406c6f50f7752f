pub mod engine;
pub mod quote;
pub mod strategies;

pub use engine::{PricingEngine, PricingError};
pub use quote::{LineItem, Quote};
pub use strategies::{PricingConfig, PricingContext};
