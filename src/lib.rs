//! WU Token Helper
//!
//! Fetches a Windows Update token for the first Microsoft account signed in to the Windows
//! identity broker, without showing any sign-in UI. Built as a DLL exporting `GetWUToken`.

#![deny(clippy::all)]

pub mod broker;
pub mod config;
pub mod encoding;
pub mod error;
pub mod fetcher;
pub mod ffi;
pub mod logging;
pub mod secret;

pub use config::Config;
pub use error::{PlatformError, TokenError};
pub use fetcher::{fetch_token, TokenTarget};
pub use secret::SecretString;

/// Fetch the token through the Windows web account manager.
#[cfg(windows)]
pub fn fetch_windows_update_token(config: &Config) -> Result<SecretString, TokenError> {
    let target = TokenTarget::from(config);
    let platform = broker::winrt::WebAccountManager::new(&target);
    fetch_token(&platform, &platform, &platform, &target)
}
