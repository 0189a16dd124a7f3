use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root of `hookfeed.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookfeedConfig {
    pub server: ServerConfig,
    pub mattermost: MattermostConfig,
    pub github: GithubConfig,
    pub feeds: FeedsConfig,
}

/// Where the webhook listener binds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

/// Chat server connection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MattermostConfig {
    /// Server base URL, e.g. `https://chat.example.com`.
    pub url: String,

    /// Bot access token.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl std::fmt::Debug for MattermostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MattermostConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for MattermostConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: Secret::new(String::new()),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Shared secret configured on the GitHub webhook. Deliveries are not
    /// authenticated when unset.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_option_secret"
    )]
    pub webhook_secret: Option<Secret<String>>,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Destination names, each optional.
///
/// A feed is only relayed when both the team and its own channel are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedsConfig {
    pub team_name: String,
    pub issue_feed_channel_name: String,
    pub pull_request_channel_name: String,
    pub release_channel_name: String,
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
