//! Error types for the token helper.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.
//! Errors stay tagged inside the crate and are folded into one HRESULT-style integer only at
//! the DLL boundary, where the launcher expects it.

use thiserror::Error;

use crate::broker::{EnumerationStatus, RequestStatus};

/// `MAKE_HRESULT(SEVERITY_ERROR, FACILITY_ITF, 0x200)`.
pub const WU_NO_ACCOUNT: i32 = 0x8004_0200_u32 as i32;
/// `MAKE_HRESULT(SEVERITY_ERROR, FACILITY_ITF, 0x400)`, or-ed with the request status.
pub const WU_TOKEN_FETCH_ERROR_BASE: i32 = 0x8004_0400_u32 as i32;
/// `MAKE_HRESULT(SEVERITY_ERROR, FACILITY_ITF, 0x800)`, or-ed with the enumeration status.
pub const WU_ENUMERATION_ERROR_BASE: i32 = 0x8004_0800_u32 as i32;

/// Low bits of a token-fetch or enumeration code that carry the platform status.
///
/// The field is 10 bits wide. Wider or negative statuses are truncated when folded so the
/// code never leaves its base's range.
pub const STATUS_FIELD_MASK: i32 = 0x3FF;

pub const S_OK: i32 = 0;
pub const E_POINTER: i32 = 0x8000_4003_u32 as i32;
pub const E_FAIL: i32 = 0x8000_4005_u32 as i32;
pub const E_OUTOFMEMORY: i32 = 0x8007_000E_u32 as i32;
pub const E_BOUNDS: i32 = 0x8000_000B_u32 as i32;
pub const E_UNEXPECTED: i32 = 0x8000_FFFF_u32 as i32;

/// Token acquisition errors.
#[derive(Error, Debug, Clone)]
pub enum TokenError {
    #[error("No account is signed in to the identity broker")]
    NoAccount,

    #[error("Token request failed with status {0:?}")]
    TokenFetch(RequestStatus),

    #[error("Account enumeration failed with status {0:?}")]
    AccountEnumeration(EnumerationStatus),

    #[error("Token request succeeded without returning a token")]
    EmptyResponse,

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A fault raised by the identity platform itself, carrying its HRESULT.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (0x{code:08X})")]
pub struct PlatformError {
    pub code: i32,
    pub message: String,
}

impl PlatformError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> Self {
        Self::new(err.code().0, err.message())
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for TokenError {
    fn from(err: windows::core::Error) -> Self {
        Self::Platform(err.into())
    }
}

impl TokenError {
    /// Fold this error into the integer status returned across the DLL boundary.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NoAccount => WU_NO_ACCOUNT,
            Self::TokenFetch(status) => {
                WU_TOKEN_FETCH_ERROR_BASE | (status.code() & STATUS_FIELD_MASK)
            }
            Self::AccountEnumeration(status) => {
                WU_ENUMERATION_ERROR_BASE | (status.code() & STATUS_FIELD_MASK)
            }
            Self::EmptyResponse => E_BOUNDS,
            Self::Platform(e) => e.code,
            Self::Config(_) => E_FAIL,
        }
    }

    /// Decode a status returned by `GetWUToken`.
    ///
    /// Returns `None` for `S_OK`. Codes outside this crate's own range come back as
    /// `Platform` errors with the code preserved.
    pub fn from_status_code(code: i32) -> Option<Self> {
        if code == S_OK {
            return None;
        }
        if code == WU_NO_ACCOUNT {
            return Some(Self::NoAccount);
        }

        let field = code & STATUS_FIELD_MASK;
        match code & !STATUS_FIELD_MASK {
            WU_TOKEN_FETCH_ERROR_BASE => {
                return Some(Self::TokenFetch(RequestStatus::from_code(field)));
            }
            WU_ENUMERATION_ERROR_BASE => {
                return Some(Self::AccountEnumeration(EnumerationStatus::from_code(field)));
            }
            _ => {}
        }

        if code == E_BOUNDS {
            return Some(Self::EmptyResponse);
        }

        Some(Self::Platform(PlatformError::new(
            code,
            "Identity platform call failed",
        )))
    }

    /// Returns a user-friendly message for display.
    pub fn user_message(&self) -> &str {
        match self {
            Self::NoAccount => "No account. Sign in with a Microsoft account in Windows Settings.",
            Self::TokenFetch(RequestStatus::UserInteractionRequired) => {
                "The account needs attention. Sign in again in Windows Settings."
            }
            Self::TokenFetch(RequestStatus::AccountProviderNotAvailable) => {
                "The Microsoft account provider is not available."
            }
            Self::TokenFetch(_) => "Failed to get a token for the signed-in account.",
            Self::AccountEnumeration(EnumerationStatus::NotAllowedByProvider) => {
                "The Microsoft account provider does not allow listing accounts."
            }
            Self::AccountEnumeration(_) => "Failed to list the signed-in accounts.",
            Self::EmptyResponse => "The identity broker returned no token.",
            Self::Platform(_) => "The Windows identity broker reported an error.",
            Self::Config(_) => "Configuration error. Please check settings.",
        }
    }

    /// Returns true if signing in again is the likely fix.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Self::NoAccount | Self::TokenFetch(RequestStatus::UserInteractionRequired)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_base_constants() {
        assert_eq!(WU_NO_ACCOUNT as u32, 0x8004_0200);
        assert_eq!(WU_TOKEN_FETCH_ERROR_BASE as u32, 0x8004_0400);
        assert!(WU_NO_ACCOUNT < 0);
    }

    #[test]
    fn test_token_fetch_status_is_or_ed_into_base() {
        let err = TokenError::TokenFetch(RequestStatus::UserInteractionRequired);
        assert_eq!(err.status_code(), WU_TOKEN_FETCH_ERROR_BASE | 3);
        assert_eq!(err.status_code() as u32, 0x8004_0403);
    }

    #[test]
    fn test_platform_code_is_preserved() {
        let err = TokenError::Platform(PlatformError::new(0x8007_0005_u32 as i32, "denied"));
        assert_eq!(err.status_code() as u32, 0x8007_0005);
        assert_eq!(err.to_string(), "Platform error: denied (0x80070005)");
    }

    #[test]
    fn test_decode_status_codes() {
        assert!(TokenError::from_status_code(S_OK).is_none());
        assert!(matches!(
            TokenError::from_status_code(WU_NO_ACCOUNT),
            Some(TokenError::NoAccount)
        ));
        assert!(matches!(
            TokenError::from_status_code(WU_TOKEN_FETCH_ERROR_BASE | 5),
            Some(TokenError::TokenFetch(RequestStatus::ProviderError))
        ));
        assert!(matches!(
            TokenError::from_status_code(WU_TOKEN_FETCH_ERROR_BASE | 0x42),
            Some(TokenError::TokenFetch(RequestStatus::Other(0x42)))
        ));
        assert!(matches!(
            TokenError::from_status_code(E_BOUNDS),
            Some(TokenError::EmptyResponse)
        ));

        match TokenError::from_status_code(E_POINTER) {
            Some(TokenError::Platform(e)) => assert_eq!(e.code, E_POINTER),
            other => panic!("unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn test_enumeration_status_has_its_own_range() {
        let err = TokenError::AccountEnumeration(EnumerationStatus::NotAllowedByProvider);
        assert_eq!(err.status_code() as u32, 0x8004_0801);
        assert!(matches!(
            TokenError::from_status_code(err.status_code()),
            Some(TokenError::AccountEnumeration(
                EnumerationStatus::NotAllowedByProvider
            ))
        ));
        assert!(matches!(
            TokenError::from_status_code(WU_ENUMERATION_ERROR_BASE | 3),
            Some(TokenError::AccountEnumeration(EnumerationStatus::ProviderError))
        ));
    }

    #[test]
    fn test_wide_statuses_stay_in_token_fetch_range() {
        let wide = TokenError::TokenFetch(RequestStatus::Other(0x1234));
        assert_eq!(wide.status_code(), WU_TOKEN_FETCH_ERROR_BASE | 0x234);
        assert!(matches!(
            TokenError::from_status_code(wide.status_code()),
            Some(TokenError::TokenFetch(RequestStatus::Other(0x234)))
        ));

        let negative = TokenError::TokenFetch(RequestStatus::Other(-1));
        assert_eq!(negative.status_code(), WU_TOKEN_FETCH_ERROR_BASE | 0x3FF);
        assert!(matches!(
            TokenError::from_status_code(negative.status_code()),
            Some(TokenError::TokenFetch(_))
        ));

        let edge = TokenError::TokenFetch(RequestStatus::Other(0x3FF));
        assert!(matches!(
            TokenError::from_status_code(edge.status_code()),
            Some(TokenError::TokenFetch(RequestStatus::Other(0x3FF)))
        ));

        let wide_enum = TokenError::AccountEnumeration(EnumerationStatus::Other(0x7FF));
        assert_eq!(wide_enum.status_code(), WU_ENUMERATION_ERROR_BASE | 0x3FF);
    }

    #[test]
    fn test_no_account_is_not_a_token_fetch_code() {
        let decoded = TokenError::from_status_code(WU_NO_ACCOUNT | 3);
        assert!(!matches!(decoded, Some(TokenError::TokenFetch(_))));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            TokenError::Config("bad".into()).user_message(),
            "Configuration error. Please check settings."
        );
        assert!(TokenError::NoAccount.user_message().starts_with("No account"));
    }

    #[test]
    fn test_requires_sign_in() {
        assert!(TokenError::NoAccount.requires_sign_in());
        assert!(TokenError::TokenFetch(RequestStatus::UserInteractionRequired).requires_sign_in());
        assert!(!TokenError::TokenFetch(RequestStatus::ProviderError).requires_sign_in());
        assert!(!TokenError::EmptyResponse.requires_sign_in());
        assert!(
            !TokenError::AccountEnumeration(EnumerationStatus::ProviderError).requires_sign_in()
        );
    }
}
