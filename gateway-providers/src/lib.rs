//! # Gateway Providers
//!
//! Provider routing and the outbound bank adapters.
//!
//! - [`ProviderResolver`] picks the authoritative configuration for a
//!   (currency, country) pair.
//! - [`ProviderAdapterFactory`] maps the resolved provider name onto a
//!   concrete adapter through the closed [`ProviderKind`] registry.
//! - [`HsbcAdapter`] speaks JSON, [`AdcbAdapter`] speaks XML.
//!
//! # Adding a provider
//! Add a variant to [`ProviderKind`], a match arm in
//! [`ProviderAdapterFactory::adapter_for`], and the adapter module itself.

mod adcb;
mod credentials;
mod factory;
mod hsbc;
mod resolver;
mod transport;

#[cfg(test)]
mod test_support;

pub use adcb::AdcbAdapter;
pub use credentials::{Credentials, ProviderCredentials};
pub use factory::{ProviderAdapterFactory, ProviderKind};
pub use hsbc::HsbcAdapter;
pub use resolver::ProviderResolver;
pub use transport::build_http_client;
