use serde::{Deserialize, Serialize};

// Credential and token shapes shared by every Google API client.

/// An Application Default Credentials file, discriminated by its `type` key.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    /// A service account key downloaded from IAM.
    ServiceAccount(ServiceAccount),
    /// End-user credentials written by `gcloud auth application-default login`.
    AuthorizedUser(AuthorizedUser),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
}

pub(crate) fn default_token_uri() -> String {
    crate::gcp::auth::TOKEN_URL.to_string()
}
