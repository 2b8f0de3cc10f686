// Identity/auth is a deliberately external collaborator (`spec.md` §1):
// this crate only needs to turn a bearer token into a user id. Real
// deployments swap in whatever verifies their own session tokens; the
// dev double here just requires a non-empty token and treats it as the
// user id directly, enough to exercise the close-1008 paths.

use async_trait::async_trait;

#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    /// Resolves a bearer token to the user id it authenticates, or `None`
    /// if the token is missing/invalid.
    async fn authenticate(&self, token: &str) -> Option<String>;
}

pub struct DevTokenAuthenticator;

#[async_trait]
impl TokenAuthenticator for DevTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_token_is_rejected() {
        assert_eq!(DevTokenAuthenticator.authenticate("").await, None);
    }

    #[tokio::test]
    async fn non_empty_token_resolves_to_itself() {
        assert_eq!(
            DevTokenAuthenticator.authenticate("user-42").await,
            Some("user-42".to_string())
        );
    }
}
