//! Silent token acquisition for the first signed-in account.

use tracing::{debug, info, warn};

use crate::broker::{AccountInfo, AccountStore, ProviderResolver, TokenBroker, TokenRequest};
use crate::config::Config;
use crate::encoding::encode_token;
use crate::error::TokenError;
use crate::secret::SecretString;

/// Where to request a token from and for whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTarget {
    pub authority_url: String,
    pub audience: String,
    pub target: String,
    pub client_id: String,
}

impl From<&Config> for TokenTarget {
    fn from(config: &Config) -> Self {
        Self {
            authority_url: config.provider.authority_url.clone(),
            audience: config.provider.audience.clone(),
            target: config.request.target.clone(),
            client_id: config.request.client_id.clone(),
        }
    }
}

/// Fetch a token for the first account and return it UTF-16LE + base64 encoded.
///
/// No retries: one silent request either succeeds or the whole operation fails.
pub fn fetch_token<S, R, B>(
    store: &S,
    resolver: &R,
    broker: &B,
    target: &TokenTarget,
) -> Result<SecretString, TokenError>
where
    S: AccountStore,
    R: ProviderResolver,
    B: TokenBroker<Account = S::Account, Provider = R::Provider>,
{
    let accounts = store.find_all_accounts()?;
    info!("Account count = {}", accounts.len());

    let Some(account) = accounts.first() else {
        warn!("No account signed in to the identity broker");
        return Err(TokenError::NoAccount);
    };
    info!("ID = {}", account.id());
    info!("Name = {}", account.user_name());

    let provider = resolver.find_provider(&target.authority_url, &target.audience)?;

    let request = TokenRequest {
        provider: &provider,
        target: &target.target,
        client_id: &target.client_id,
    };
    let result = broker.get_token_silently(&request, account)?;

    if !result.status.is_success() {
        warn!("Silent token request failed: {:?}", result.status);
        return Err(TokenError::TokenFetch(result.status));
    }

    let token = result.tokens.first().ok_or(TokenError::EmptyResponse)?;
    debug!("Token received ({} chars)", token.len());

    let encoded = encode_token(token.as_str());
    debug!("Encoded token ({} chars)", encoded.len());

    Ok(encoded)
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::cell::{Cell, RefCell};

    use crate::broker::{
        AccountInfo, AccountStore, ProviderResolver, RequestStatus, TokenBroker, TokenRequest,
        TokenResult,
    };
    use crate::error::{PlatformError, TokenError};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FakeAccount {
        pub id: String,
        pub user_name: String,
    }

    impl FakeAccount {
        pub fn new(id: &str, user_name: &str) -> Self {
            Self {
                id: id.into(),
                user_name: user_name.into(),
            }
        }
    }

    impl AccountInfo for FakeAccount {
        fn id(&self) -> &str {
            &self.id
        }

        fn user_name(&self) -> &str {
            &self.user_name
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FakeProvider {
        pub authority_url: String,
        pub audience: String,
    }

    /// Records every call so tests can assert on the sequence.
    pub struct FakePlatform {
        pub accounts: Result<Vec<FakeAccount>, TokenError>,
        pub status: RequestStatus,
        pub tokens: Vec<String>,
        pub provider_calls: Cell<usize>,
        pub token_requests: RefCell<Vec<(FakeProvider, String, String, FakeAccount)>>,
    }

    impl FakePlatform {
        pub fn new(accounts: Vec<FakeAccount>) -> Self {
            Self {
                accounts: Ok(accounts),
                status: RequestStatus::Success,
                tokens: vec!["abc123".into()],
                provider_calls: Cell::new(0),
                token_requests: RefCell::new(Vec::new()),
            }
        }

        pub fn with_status(mut self, status: RequestStatus) -> Self {
            self.status = status;
            self
        }

        pub fn with_tokens(mut self, tokens: &[&str]) -> Self {
            self.tokens = tokens.iter().map(|t| t.to_string()).collect();
            self
        }

        pub fn failing(err: TokenError) -> Self {
            let mut platform = Self::new(Vec::new());
            platform.accounts = Err(err);
            platform
        }

        pub fn token_request_count(&self) -> usize {
            self.token_requests.borrow().len()
        }
    }

    impl AccountStore for FakePlatform {
        type Account = FakeAccount;

        fn find_all_accounts(&self) -> Result<Vec<FakeAccount>, TokenError> {
            self.accounts.clone()
        }
    }

    impl ProviderResolver for FakePlatform {
        type Provider = FakeProvider;

        fn find_provider(
            &self,
            authority_url: &str,
            audience: &str,
        ) -> Result<FakeProvider, PlatformError> {
            self.provider_calls.set(self.provider_calls.get() + 1);
            Ok(FakeProvider {
                authority_url: authority_url.into(),
                audience: audience.into(),
            })
        }
    }

    impl TokenBroker for FakePlatform {
        type Account = FakeAccount;
        type Provider = FakeProvider;

        fn get_token_silently(
            &self,
            request: &TokenRequest<'_, FakeProvider>,
            account: &FakeAccount,
        ) -> Result<TokenResult, PlatformError> {
            self.token_requests.borrow_mut().push((
                request.provider.clone(),
                request.target.to_string(),
                request.client_id.to_string(),
                account.clone(),
            ));

            if self.status.is_success() {
                Ok(TokenResult {
                    status: self.status,
                    tokens: self.tokens.iter().map(|t| t.as_str().into()).collect(),
                })
            } else {
                Ok(TokenResult::failed(self.status))
            }
        }
    }
}
