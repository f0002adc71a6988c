use crate::{TokenReview, TokenReviewSpec, TokenReviewStatus};
use jolokia_gateway_core::{AuthError, AuthenticateToken, Principal};
use kube::{api::PostParams, Api, Client};
use tracing::{debug, warn};

/// Validates bearer tokens against the cluster's TokenReview API.
///
/// Verdicts are never cached: a token may be revoked between calls, so every
/// inbound call pays one review round-trip in exchange for freshness.
#[derive(Clone)]
pub struct TokenReviewValidator {
    client: Client,
}

// === impl TokenReviewValidator ===

impl TokenReviewValidator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn principal(status: &TokenReviewStatus) -> Result<Principal, AuthError> {
        if !status.authenticated.unwrap_or(false) {
            let error = status.error.as_deref().unwrap_or("not authenticated");
            warn!(%error, "token review rejected the credential");
            return Err(AuthError::Rejected(error.to_string()));
        }

        let user = status
            .user
            .as_ref()
            .ok_or_else(|| AuthError::Review("authenticated but no user info".to_string()))?;
        let username = user
            .username
            .clone()
            .ok_or_else(|| AuthError::Review("authenticated user has no username".to_string()))?;

        Ok(Principal {
            username,
            groups: user.groups.clone().unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl AuthenticateToken for TokenReviewValidator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        // Checked before any network call.
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let review = TokenReview {
            spec: TokenReviewSpec {
                token: Some(token.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let api = Api::<TokenReview>::all(self.client.clone());
        let reviewed = api
            .create(&PostParams::default(), &review)
            .await
            .map_err(|error| AuthError::Review(error.to_string()))?;

        let status = reviewed
            .status
            .ok_or_else(|| AuthError::Review("no status returned".to_string()))?;
        let principal = Self::principal(&status)?;
        debug!(username = %principal.username, "token review accepted the credential");
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserInfo;

    fn status(authenticated: Option<bool>, user: Option<UserInfo>) -> TokenReviewStatus {
        TokenReviewStatus {
            authenticated,
            user,
            ..Default::default()
        }
    }

    #[test]
    fn authenticated_status_yields_principal() {
        let status = status(
            Some(true),
            Some(UserInfo {
                username: Some("system:serviceaccount:hawtio-dev:caller".to_string()),
                groups: Some(vec!["system:serviceaccounts".to_string()]),
                ..Default::default()
            }),
        );

        let principal = TokenReviewValidator::principal(&status).unwrap();
        assert_eq!(principal.username, "system:serviceaccount:hawtio-dev:caller");
        assert_eq!(principal.groups, vec!["system:serviceaccounts".to_string()]);
    }

    #[test]
    fn unauthenticated_status_is_rejected_with_detail() {
        let status = TokenReviewStatus {
            authenticated: Some(false),
            error: Some("token expired".to_string()),
            ..Default::default()
        };

        assert_eq!(
            TokenReviewValidator::principal(&status),
            Err(AuthError::Rejected("token expired".to_string()))
        );
    }

    #[test]
    fn missing_verdict_is_rejected() {
        assert!(matches!(
            TokenReviewValidator::principal(&status(None, None)),
            Err(AuthError::Rejected(_))
        ));
    }

    #[test]
    fn authenticated_without_user_is_a_review_failure() {
        assert!(matches!(
            TokenReviewValidator::principal(&status(Some(true), None)),
            Err(AuthError::Review(_))
        ));
    }
}
