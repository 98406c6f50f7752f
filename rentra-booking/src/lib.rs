pub mod error;
pub mod invoice;
pub mod lifecycle;
pub mod models;
pub mod reports;
pub mod repository;
pub mod service;

pub use error::BookingError;
pub use models::{Booking, BookingStatus, Deposit, DepositStatus, Fine, FineType, Invoice};
pub use reports::{FinancialReport, ReportService, UtilizationReport};
pub use repository::BookingRepository;
pub use service::{BookingPolicy, BookingService, CreatedBooking};
