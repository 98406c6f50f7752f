pub mod authz;
pub mod payment;
pub mod repository;

pub use authz::{AuthContext, Forbidden, Permission, Role};
pub use payment::{MockPayProvider, PaymentError, PaymentProvider};
pub use repository::StoreError;
