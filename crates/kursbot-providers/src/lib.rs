//! HTTP adapters for the two upstream collaborators.
//!
//! Both clients carry a per-request timeout so a slow upstream fails fast
//! instead of stalling the caller.

pub mod currency;
pub mod weather;

pub use currency::ExchangeRateApi;
pub use weather::OpenWeatherMap;
