//! ctn-client
//!
//! Live HTTP implementation of the [`Backend`](ctn_backend::Backend) seam:
//! a reqwest client speaking the cafeteria API's JSON dialect, plus its
//! environment-driven configuration. Everything above this crate is
//! network-agnostic.

mod config;
mod rest;

pub use config::{ClientConfig, ENV_BASE_URL, ENV_TIMEOUT_SECS};
pub use rest::RestBackend;
