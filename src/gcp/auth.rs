//! # GCP Authentication
//!
//! Resolves Application Default Credentials and exchanges them for an OAuth
//! 2.0 access token with the `cloud-platform` scope. The lookup order is:
//!
//! 1. the file named by `GOOGLE_APPLICATION_CREDENTIALS`;
//! 2. the gcloud well-known file (`~/.config/gcloud/application_default_credentials.json`);
//! 3. the Compute Engine metadata server, for runs on a GCE VM.
//!
//! A credentials file is either a service account key (signed JWT grant) or
//! an authorized user (refresh token grant).

use anyhow::{Context, Result, bail};
use cached::proc_macro::once;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::CLIENT;
use crate::gcp::types::{AccessToken, AuthorizedUser, CredentialsFile, ServiceAccount};

/// The Google OAuth2 token endpoint.
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Claims of the self-signed JWT sent in the service account grant.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The service account's email address.
    iss: String,
    scope: String,
    /// The token endpoint the assertion is for.
    aud: String,
    exp: u64,
    iat: u64,
}

/// Returns an access token for the ambient credentials.
///
/// A successful token is reused for 55 minutes, then fetched again, so a
/// long walk never presents a token past its one hour lifetime.
#[once(time = 3300, result = true)]
pub async fn get_access_token() -> Result<String> {
    match find_credentials_file(std::env::var_os(CREDENTIALS_ENV).map(PathBuf::from))? {
        Some(path) => match read_credentials_file(&path)? {
            CredentialsFile::ServiceAccount(sa) => token_from_service_account(&sa)
                .await
                .with_context(|| format!("Service account {} token failed", sa.client_email)),
            CredentialsFile::AuthorizedUser(user) => token_from_authorized_user(&user)
                .await
                .context("Authorized user token failed"),
        },
        None => token_from_metadata_server().await.context(
            "No credentials file found and the GCE metadata server is unreachable; \
             set GOOGLE_APPLICATION_CREDENTIALS or run `gcloud auth application-default login`",
        ),
    }
}

/// Picks the credentials file: an explicit path wins, then the gcloud
/// well-known file if it exists. `None` means "use the metadata server".
fn find_credentials_file(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!(
                "{} points to {}, which does not exist",
                CREDENTIALS_ENV,
                path.display()
            );
        }
        return Ok(Some(path));
    }
    Ok(well_known_credentials_path().filter(|p| p.exists()))
}

#[cfg(not(windows))]
fn well_known_credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("gcloud")
            .join("application_default_credentials.json")
    })
}

#[cfg(windows)]
fn well_known_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|appdata| {
        appdata
            .join("gcloud")
            .join("application_default_credentials.json")
    })
}

fn read_credentials_file(path: &Path) -> Result<CredentialsFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
    parse_credentials(&json)
        .with_context(|| format!("Invalid credentials file {}", path.display()))
}

fn parse_credentials(json: &str) -> Result<CredentialsFile> {
    Ok(serde_json::from_str(json)?)
}

fn build_claims(sa: &ServiceAccount, now: u64) -> Claims {
    Claims {
        iss: sa.client_email.clone(),
        scope: CLOUD_PLATFORM_SCOPE.to_string(),
        aud: sa.token_uri.clone(),
        exp: now + 3600,
        iat: now,
    }
}

async fn token_from_service_account(sa: &ServiceAccount) -> Result<String> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let claims = build_claims(sa, now);

    let mut header = Header::new(Algorithm::RS256);
    header.kid = sa.private_key_id.clone();
    let encoding_key = EncodingKey::from_rsa_pem(sa.private_key.as_bytes())
        .context("Service account private_key is not a valid RSA PEM")?;
    let jwt = encode(&header, &claims, &encoding_key)?;

    let params = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
        ("assertion", jwt.as_str()),
    ];
    exchange(&sa.token_uri, &params).await
}

async fn token_from_authorized_user(user: &AuthorizedUser) -> Result<String> {
    let params = [
        ("grant_type", "refresh_token"),
        ("client_id", user.client_id.as_str()),
        ("client_secret", user.client_secret.as_str()),
        ("refresh_token", user.refresh_token.as_str()),
    ];
    exchange(TOKEN_URL, &params).await
}

async fn token_from_metadata_server() -> Result<String> {
    let response = CLIENT
        .get(METADATA_TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .context("Failed to reach the GCE metadata server")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("Metadata server token request failed ({}): {}", status, body);
    }

    let token: AccessToken = response
        .json()
        .await
        .context("Invalid metadata server token response")?;
    Ok(token.access_token)
}

async fn exchange(token_uri: &str, params: &[(&str, &str)]) -> Result<String> {
    let response = CLIENT
        .post(token_uri)
        .form(params)
        .send()
        .await
        .context("Failed to call the OAuth2 token endpoint")?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        bail!("Failed to get access token: {}", error_text);
    }

    let token_response: AccessToken = response
        .json()
        .await
        .context("Invalid OAuth2 token response")?;
    Ok(token_response.access_token)
}
