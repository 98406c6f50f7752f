pub mod app_config;
pub mod memory;
pub mod seed;

pub use app_config::Config;
pub use memory::{MemoryBookingStore, MemoryCarStore};
