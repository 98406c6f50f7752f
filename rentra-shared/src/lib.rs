pub mod events;
pub mod money;

pub use events::BookingEvent;
pub use money::Money;
