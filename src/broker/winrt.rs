//! Identity broker backed by `Windows.Security.Authentication.Web.Core`.

use once_cell::unsync::OnceCell;
use tracing::{debug, warn};
use windows::core::HSTRING;
use windows::Security::Authentication::Web::Core::{
    FindAllWebAccountsStatus, WebAuthenticationCoreManager, WebTokenRequest,
};
use windows::Security::Credentials::{WebAccount, WebAccountProvider};

use super::blocking::wait;
use super::{
    AccountInfo, AccountStore, EnumerationStatus, ProviderResolver, RequestStatus, TokenBroker,
    TokenRequest, TokenResult,
};
use crate::error::{PlatformError, TokenError};
use crate::fetcher::TokenTarget;
use crate::secret::SecretString;

/// A signed-in account, with its identity read once at enumeration time.
pub struct WinAccount {
    id: String,
    user_name: String,
    inner: WebAccount,
}

impl WinAccount {
    fn from_web_account(account: WebAccount) -> Result<Self, PlatformError> {
        Ok(Self {
            id: account.Id()?.to_string(),
            user_name: account.UserName()?.to_string(),
            inner: account,
        })
    }
}

impl AccountInfo for WinAccount {
    fn id(&self) -> &str {
        &self.id
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }
}

/// The Windows web account manager.
///
/// Account enumeration in the public API is scoped to a provider, so the configured provider
/// is resolved once, on first use, and shared by enumeration and the token request.
pub struct WebAccountManager {
    authority_url: HSTRING,
    audience: HSTRING,
    client_id: HSTRING,
    provider: OnceCell<WebAccountProvider>,
}

impl WebAccountManager {
    pub fn new(target: &TokenTarget) -> Self {
        Self {
            authority_url: HSTRING::from(target.authority_url.as_str()),
            audience: HSTRING::from(target.audience.as_str()),
            client_id: HSTRING::from(target.client_id.as_str()),
            provider: OnceCell::new(),
        }
    }

    fn configured_provider(&self) -> Result<&WebAccountProvider, PlatformError> {
        self.provider.get_or_try_init(|| {
            let provider = resolve_provider(&self.authority_url, &self.audience)?;
            debug!("Resolved account provider {}", provider.Id()?);
            Ok(provider)
        })
    }
}

fn resolve_provider(
    authority_url: &HSTRING,
    audience: &HSTRING,
) -> Result<WebAccountProvider, PlatformError> {
    wait(WebAuthenticationCoreManager::FindAccountProviderWithAuthorityAsync(
        authority_url,
        audience,
    ))
}

impl AccountStore for WebAccountManager {
    type Account = WinAccount;

    fn find_all_accounts(&self) -> Result<Vec<WinAccount>, TokenError> {
        let provider = self.configured_provider()?;
        let result = wait(WebAuthenticationCoreManager::FindAllAccountsWithClientIdAsync(
            provider,
            &self.client_id,
        ))?;

        let status = enumeration_status(result.Status()?);
        if !status.is_success() {
            warn!("Account enumeration declined: {:?}", status);
            return Err(TokenError::AccountEnumeration(status));
        }

        let accounts = result.Accounts()?;
        let accounts = (0..accounts.Size()?)
            .map(|i| -> Result<WinAccount, PlatformError> {
                WinAccount::from_web_account(accounts.GetAt(i)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }
}

impl ProviderResolver for WebAccountManager {
    type Provider = WebAccountProvider;

    fn find_provider(
        &self,
        authority_url: &str,
        audience: &str,
    ) -> Result<WebAccountProvider, PlatformError> {
        let authority_url = HSTRING::from(authority_url);
        let audience = HSTRING::from(audience);
        if authority_url == self.authority_url && audience == self.audience {
            return self.configured_provider().cloned();
        }
        resolve_provider(&authority_url, &audience)
    }
}

impl TokenBroker for WebAccountManager {
    type Account = WinAccount;
    type Provider = WebAccountProvider;

    fn get_token_silently(
        &self,
        request: &TokenRequest<'_, WebAccountProvider>,
        account: &WinAccount,
    ) -> Result<TokenResult, PlatformError> {
        let web_request = WebTokenRequest::Create(
            request.provider,
            &HSTRING::from(request.target),
            &HSTRING::from(request.client_id),
        )?;
        let result = wait(
            WebAuthenticationCoreManager::GetTokenSilentlyWithWebAccountAsync(
                &web_request,
                &account.inner,
            ),
        )?;

        let status = RequestStatus::from_code(result.ResponseStatus()?.0);
        if !status.is_success() {
            if let Ok(provider_error) = result.ResponseError() {
                warn!(
                    "Provider error 0x{:08X}: {}",
                    provider_error.ErrorCode().unwrap_or_default(),
                    provider_error.ErrorMessage().unwrap_or_default()
                );
            }
            return Ok(TokenResult::failed(status));
        }

        let data = result.ResponseData()?;
        let tokens = (0..data.Size()?)
            .map(|i| -> Result<SecretString, PlatformError> {
                Ok(data.GetAt(i)?.Token()?.to_string().into())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TokenResult { status, tokens })
    }
}

fn enumeration_status(status: FindAllWebAccountsStatus) -> EnumerationStatus {
    EnumerationStatus::from_code(status.0)
}
