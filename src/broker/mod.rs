//! Identity broker seam.
//!
//! The token operation only talks to the platform through the three narrow traits below.
//! `winrt` implements them over `Windows.Security.Authentication.Web.Core`; tests plug in fakes.

#[cfg(windows)]
pub mod blocking;
#[cfg(windows)]
pub mod winrt;

use crate::error::{PlatformError, TokenError};
use crate::secret::SecretString;

/// Read-only view of an account held by the platform identity store.
pub trait AccountInfo {
    fn id(&self) -> &str;
    fn user_name(&self) -> &str;
}

/// Enumerates accounts known to the identity broker, in platform order.
pub trait AccountStore {
    type Account: AccountInfo;

    /// Platform faults come back as `TokenError::Platform`; an enumeration the broker
    /// declined comes back as `TokenError::AccountEnumeration`.
    fn find_all_accounts(&self) -> Result<Vec<Self::Account>, TokenError>;
}

/// Resolves an identity-provider endpoint.
pub trait ProviderResolver {
    type Provider;

    fn find_provider(
        &self,
        authority_url: &str,
        audience: &str,
    ) -> Result<Self::Provider, PlatformError>;
}

/// Issues tokens without showing any sign-in UI.
pub trait TokenBroker {
    type Account;
    type Provider;

    fn get_token_silently(
        &self,
        request: &TokenRequest<'_, Self::Provider>,
        account: &Self::Account,
    ) -> Result<TokenResult, PlatformError>;
}

/// A single token request. Built fresh per call and never stored.
#[derive(Debug)]
pub struct TokenRequest<'a, P> {
    pub provider: &'a P,
    pub target: &'a str,
    pub client_id: &'a str,
}

/// Broker response: a status plus the returned token entries.
#[derive(Debug)]
pub struct TokenResult {
    pub status: RequestStatus,
    pub tokens: Vec<SecretString>,
}

impl TokenResult {
    #[cfg(test)]
    pub fn success(token: impl Into<String>) -> Self {
        Self {
            status: RequestStatus::Success,
            tokens: vec![SecretString::new(token.into())],
        }
    }

    pub fn failed(status: RequestStatus) -> Self {
        Self {
            status,
            tokens: Vec::new(),
        }
    }
}

/// Mirror of the platform `WebTokenRequestStatus` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    UserCancel,
    AccountSwitch,
    UserInteractionRequired,
    AccountProviderNotAvailable,
    ProviderError,
    /// A value this crate does not know about, kept verbatim.
    Other(i32),
}

impl RequestStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::UserCancel,
            2 => Self::AccountSwitch,
            3 => Self::UserInteractionRequired,
            4 => Self::AccountProviderNotAvailable,
            5 => Self::ProviderError,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::UserCancel => 1,
            Self::AccountSwitch => 2,
            Self::UserInteractionRequired => 3,
            Self::AccountProviderNotAvailable => 4,
            Self::ProviderError => 5,
            Self::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Mirror of the platform `FindAllWebAccountsStatus` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationStatus {
    Success,
    NotAllowedByProvider,
    NotSupportedByProvider,
    ProviderError,
    Other(i32),
}

impl EnumerationStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::NotAllowedByProvider,
            2 => Self::NotSupportedByProvider,
            3 => Self::ProviderError,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NotAllowedByProvider => 1,
            Self::NotSupportedByProvider => 2,
            Self::ProviderError => 3,
            Self::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}
