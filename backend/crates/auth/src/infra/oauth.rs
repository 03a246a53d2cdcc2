//! Identity Provider HTTP Client
//!
//! Verifies Google and Facebook assertions against the providers' own
//! endpoints. Every call is bounded by the configured provider timeout.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::config::{AuthConfig, FacebookOAuthConfig, GoogleOAuthConfig};
use crate::domain::entity::federated_identity::FederatedIdentity;
use crate::domain::gateway::IdentityProvider;
use crate::domain::value_object::provider::AuthProvider;
use crate::error::{AuthError, AuthResult};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com/v18.0";

/// `reqwest`-backed identity provider
#[derive(Clone)]
pub struct HttpIdentityProvider {
    http: Client,
    google: Option<GoogleOAuthConfig>,
    facebook: Option<FacebookOAuthConfig>,
}

impl HttpIdentityProvider {
    pub fn new(config: Arc<AuthConfig>) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            google: config.google.clone(),
            facebook: config.facebook.clone(),
        })
    }

    fn google(&self) -> AuthResult<&GoogleOAuthConfig> {
        self.google
            .as_ref()
            .ok_or_else(|| AuthError::Configuration("Google OAuth is not configured".to_string()))
    }

    fn facebook(&self) -> AuthResult<&FacebookOAuthConfig> {
        self.facebook
            .as_ref()
            .ok_or_else(|| AuthError::Configuration("Facebook OAuth is not configured".to_string()))
    }

    async fn facebook_profile(&self, access_token: &str) -> AuthResult<FederatedIdentity> {
        let profile: FacebookProfile = fetch_json(
            AuthProvider::Facebook,
            self.http
                .get(format!("{FACEBOOK_GRAPH_URL}/me"))
                .query(&[
                    ("fields", "id,name,email,picture"),
                    ("access_token", access_token),
                ]),
        )
        .await?;

        Ok(FederatedIdentity {
            provider: AuthProvider::Facebook,
            provider_id: profile.id,
            email: profile.email,
            display_name: profile.name,
            picture_url: profile.picture.map(|p| p.data.url),
        })
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn google_consent_url(&self, state: &str) -> AuthResult<String> {
        let google = self.google()?;
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", google.client_id.as_str()),
                ("redirect_uri", google.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("Failed to build consent URL: {e}")))?;

        Ok(url.into())
    }

    async fn exchange_google_code(&self, code: &str) -> AuthResult<FederatedIdentity> {
        let google = self.google()?;

        let token: GoogleTokenResponse = fetch_json(
            AuthProvider::Google,
            self.http.post(GOOGLE_TOKEN_URL).form(&[
                ("code", code),
                ("client_id", google.client_id.as_str()),
                ("client_secret", google.client_secret.as_str()),
                ("redirect_uri", google.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ]),
        )
        .await?;

        let info: GoogleUserInfo = fetch_json(
            AuthProvider::Google,
            self.http
                .get(GOOGLE_USERINFO_URL)
                .bearer_auth(&token.access_token),
        )
        .await?;

        Ok(info.into_identity())
    }

    async fn verify_google_id_token(&self, id_token: &str) -> AuthResult<FederatedIdentity> {
        let google = self.google()?;

        let info: GoogleTokenInfo = fetch_json(
            AuthProvider::Google,
            self.http
                .get(GOOGLE_TOKENINFO_URL)
                .query(&[("id_token", id_token)]),
        )
        .await?;

        if info.aud != google.client_id {
            return Err(AuthError::OAuthProvider(
                "Google ID token was issued for another client".to_string(),
            ));
        }

        Ok(info.into_identity())
    }

    async fn exchange_facebook_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> AuthResult<FederatedIdentity> {
        let facebook = self.facebook()?;
        let redirect_uri = redirect_uri.unwrap_or(facebook.redirect_uri.as_str());

        let token: FacebookTokenResponse = fetch_json(
            AuthProvider::Facebook,
            self.http
                .get(format!("{FACEBOOK_GRAPH_URL}/oauth/access_token"))
                .query(&[
                    ("client_id", facebook.app_id.as_str()),
                    ("client_secret", facebook.app_secret.as_str()),
                    ("redirect_uri", redirect_uri),
                    ("code", code),
                ]),
        )
        .await?;

        self.facebook_profile(&token.access_token).await
    }

    async fn verify_facebook_access_token(
        &self,
        access_token: &str,
    ) -> AuthResult<FederatedIdentity> {
        let facebook = self.facebook()?;
        let app_token = format!("{}|{}", facebook.app_id, facebook.app_secret);

        let debug: FacebookDebugToken = fetch_json(
            AuthProvider::Facebook,
            self.http
                .get(format!("{FACEBOOK_GRAPH_URL}/debug_token"))
                .query(&[
                    ("input_token", access_token),
                    ("access_token", app_token.as_str()),
                ]),
        )
        .await?;

        if !debug.data.is_valid || debug.data.app_id != facebook.app_id {
            return Err(AuthError::OAuthProvider(
                "Facebook access token is invalid for this app".to_string(),
            ));
        }

        self.facebook_profile(access_token).await
    }
}

/// Send a request and decode a 2xx JSON body
///
/// Timeouts, connection failures and 5xx answers are `ProviderUnavailable`;
/// any other failure is `OAuthProvider`. Response bodies stay in the log.
async fn fetch_json<T>(provider: AuthProvider, request: RequestBuilder) -> AuthResult<T>
where
    T: DeserializeOwned,
{
    let response = request.send().await.map_err(|e| {
        tracing::warn!(%provider, error = %e, "Identity provider request failed");
        if e.is_timeout() || e.is_connect() {
            AuthError::ProviderUnavailable(format!("{} did not respond", provider.label()))
        } else {
            AuthError::OAuthProvider(format!("{} request failed", provider.label()))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%provider, %status, body = %body, "Identity provider rejected request");
        return Err(if status.is_server_error() {
            AuthError::ProviderUnavailable(format!("{} returned {}", provider.label(), status))
        } else {
            AuthError::OAuthProvider(format!("{} returned {}", provider.label(), status))
        });
    }

    response.json::<T>().await.map_err(|e| {
        tracing::warn!(%provider, error = %e, "Unexpected identity provider response");
        AuthError::OAuthProvider(format!("Unexpected response from {}", provider.label()))
    })
}

// ============================================================================
// Provider Payloads
// ============================================================================

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleUserInfo {
    fn into_identity(self) -> FederatedIdentity {
        FederatedIdentity {
            provider: AuthProvider::Google,
            email: verified_email(&self.id, self.email, self.verified_email),
            provider_id: self.id,
            display_name: self.name,
            picture_url: self.picture,
        }
    }
}

/// `tokeninfo` sends `email_verified` as the string `"true"`
#[derive(Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    email_verified: Option<FlagValue>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleTokenInfo {
    fn into_identity(self) -> FederatedIdentity {
        let verified = self.email_verified.is_some_and(|flag| flag.is_true());
        FederatedIdentity {
            provider: AuthProvider::Google,
            email: verified_email(&self.sub, self.email, verified),
            provider_id: self.sub,
            display_name: self.name,
            picture_url: self.picture,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Text(String),
}

impl FlagValue {
    fn is_true(&self) -> bool {
        match self {
            FlagValue::Bool(value) => *value,
            FlagValue::Text(value) => value.eq_ignore_ascii_case("true"),
        }
    }
}

/// Only a provider-verified address may be matched against accounts
fn verified_email(provider_id: &str, email: Option<String>, verified: bool) -> Option<String> {
    if verified {
        return email;
    }
    if email.is_some() {
        tracing::warn!(provider_id, "Google reported an unverified email; ignoring it");
    }
    None
}

#[derive(Deserialize)]
struct FacebookTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct FacebookDebugToken {
    data: FacebookDebugTokenData,
}

#[derive(Deserialize)]
struct FacebookDebugTokenData {
    #[serde(default)]
    app_id: String,
    #[serde(default)]
    is_valid: bool,
}

#[derive(Deserialize)]
struct FacebookProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<FacebookPicture>,
}

#[derive(Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Deserialize)]
struct FacebookPictureData {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(config: AuthConfig) -> HttpIdentityProvider {
        HttpIdentityProvider::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_consent_url_carries_client_and_state() {
        let mut config = AuthConfig::new("secret");
        config.google = Some(GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "https://api.example.com/google-auth/callback/google".to_string(),
        });

        let url = provider(config).google_consent_url("state-xyz").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "state-xyz");
        assert_eq!(params["response_type"], "code");
        assert_eq!(
            params["redirect_uri"],
            "https://api.example.com/google-auth/callback/google"
        );
        assert!(!url.contains("shh"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_configuration_error() {
        let provider = provider(AuthConfig::new("secret"));

        assert!(matches!(
            provider.google_consent_url("s"),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            provider.exchange_google_code("code").await,
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            provider.verify_facebook_access_token("token").await,
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            provider.exchange_facebook_code("code", None).await,
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_google_userinfo_keeps_only_verified_email() {
        let verified: GoogleUserInfo = serde_json::from_str(
            r#"{"id":"G1","email":"ada@example.com","verified_email":true,"name":"Ada"}"#,
        )
        .unwrap();
        let identity = verified.into_identity();
        assert_eq!(identity.provider_id, "G1");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));

        let unverified: GoogleUserInfo = serde_json::from_str(
            r#"{"id":"G2","email":"victim@example.com","verified_email":false}"#,
        )
        .unwrap();
        assert!(unverified.into_identity().email.is_none());

        let missing_flag: GoogleUserInfo =
            serde_json::from_str(r#"{"id":"G3","email":"x@example.com"}"#).unwrap();
        assert!(missing_flag.into_identity().email.is_none());
    }

    #[test]
    fn test_google_tokeninfo_reads_string_or_bool_flag() {
        let as_string: GoogleTokenInfo = serde_json::from_str(
            r#"{"aud":"c","sub":"G1","email":"ada@example.com","email_verified":"true"}"#,
        )
        .unwrap();
        assert_eq!(as_string.into_identity().email.as_deref(), Some("ada@example.com"));

        let as_bool: GoogleTokenInfo = serde_json::from_str(
            r#"{"aud":"c","sub":"G1","email":"ada@example.com","email_verified":true}"#,
        )
        .unwrap();
        assert!(as_bool.into_identity().email.is_some());

        let unverified: GoogleTokenInfo = serde_json::from_str(
            r#"{"aud":"c","sub":"G2","email":"victim@example.com","email_verified":"false"}"#,
        )
        .unwrap();
        let identity = unverified.into_identity();
        assert_eq!(identity.provider_id, "G2");
        assert!(identity.email.is_none());
    }

    #[test]
    fn test_facebook_profile_payload() {
        let profile: FacebookProfile = serde_json::from_str(
            r#"{"id":"42","name":"Ada","picture":{"data":{"url":"https://img/fb.png"}}}"#,
        )
        .unwrap();

        assert_eq!(profile.id, "42");
        assert!(profile.email.is_none());
        assert_eq!(profile.picture.unwrap().data.url, "https://img/fb.png");
    }
}
