//! Domain models for the payment gateway.

pub mod amount;
pub mod payment;
pub mod provider;

pub use amount::Amount;
pub use payment::{CallbackOutcome, Payment, PaymentId, PaymentStatus, PaymentType};
pub use provider::{Country, Currency, PaymentDetails, Provider, ProviderConfiguration};
