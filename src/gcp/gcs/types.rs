use serde::Deserialize;

/// Object metadata returned by a successful upload.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ObjectItem {
    pub name: String,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(rename = "contentType")]
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(rename = "md5Hash")]
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
}
