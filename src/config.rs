//! Process configuration for the CMS client.
//!
//! Built once at startup (usually via [`CmsConfig::from_env`]) and handed to
//! [`crate::cms::CmsClient::new`] and [`crate::cms::ContentService::new`].
//! Nothing below the binaries reads the process environment directly.

use std::path::PathBuf;

use crate::cms::error::{CmsError, CmsResult};
use crate::util::env::{env_first, env_opt, env_parse, init_env, preflight_check};

pub const DEFAULT_BASE_URL: &str = "https://api.contentstack.io/v3";
pub const DEFAULT_HOME_ENTRY_UID: &str = "bltbfc67d1a1215b35c";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_STORAGE_PATH: &str = ".multimart/local_storage.json";

const ENV_API_KEY: &str = "CONTENTSTACK_API_KEY";
const ENV_MANAGEMENT_TOKEN: &str = "CONTENTSTACK_MANAGEMENT_TOKEN";
const ENV_DELIVERY_TOKEN: &str = "CONTENTSTACK_DELIVERY_TOKEN";
const ENV_ENVIRONMENT: &str = "CONTENTSTACK_ENVIRONMENT";
const ENV_BRANCH: &str = "CONTENTSTACK_BRANCH";
const ENV_BASE_URL: &str = "CONTENTSTACK_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "CONTENTSTACK_TIMEOUT_SECS";
const ENV_HOME_ENTRY_UID: &str = "CONTENTSTACK_HOME_ENTRY_UID";
const ENV_STORAGE_PATH: &str = "MULTIMART_STORAGE_PATH";

#[derive(Clone)]
pub struct CmsConfig {
    pub api_key: Option<String>,
    /// Management token, or the delivery token when no management token is set.
    pub management_token: Option<String>,
    pub environment: Option<String>,
    /// Branch scoping; appended as `branch=` to every request when set.
    pub branch: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub home_entry_uid: String,
    pub storage_path: PathBuf,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            management_token: None,
            environment: None,
            branch: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            home_entry_uid: DEFAULT_HOME_ENTRY_UID.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

// Hand-written so tokens never end up in debug logs.
impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("CmsConfig")
            .field("api_key", &mask(&self.api_key))
            .field("management_token", &mask(&self.management_token))
            .field("environment", &self.environment)
            .field("branch", &self.branch)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("home_entry_uid", &self.home_entry_uid)
            .field("storage_path", &self.storage_path)
            .finish()
    }
}

impl CmsConfig {
    /// Credentials-only constructor; everything else takes its default.
    pub fn new(api_key: impl Into<String>, management_token: impl Into<String>) -> Self {
        Self {
            api_key: non_blank(api_key.into()),
            management_token: non_blank(management_token.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.and_then(non_blank);
        self
    }

    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment.and_then(non_blank);
        self
    }

    pub fn with_home_entry_uid(mut self, uid: impl Into<String>) -> Self {
        self.home_entry_uid = uid.into();
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Read the configuration from the process environment (after loading `.env`).
    ///
    /// Missing credentials are not an error here; [`CmsConfig::validate`] decides.
    pub fn from_env() -> Self {
        init_env();
        let _ = preflight_check(
            "cms",
            &[],
            &[
                ENV_API_KEY,
                ENV_MANAGEMENT_TOKEN,
                ENV_ENVIRONMENT,
                ENV_BRANCH,
                ENV_BASE_URL,
            ],
        );
        Self {
            api_key: env_opt(ENV_API_KEY),
            management_token: env_first(&[ENV_MANAGEMENT_TOKEN, ENV_DELIVERY_TOKEN]),
            environment: env_opt(ENV_ENVIRONMENT),
            branch: env_opt(ENV_BRANCH),
            base_url: env_opt(ENV_BASE_URL)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: env_parse(ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS),
            home_entry_uid: env_opt(ENV_HOME_ENTRY_UID)
                .unwrap_or_else(|| DEFAULT_HOME_ENTRY_UID.to_string()),
            storage_path: env_opt(ENV_STORAGE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
        }
    }

    /// Both credentials must be present before any request is issued.
    pub fn validate(&self) -> CmsResult<()> {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push("API key");
        }
        if self.management_token.is_none() {
            missing.push("management/delivery token");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CmsError::Configuration(format!(
                "Contentstack {} required",
                missing.join(" and ")
            )))
        }
    }
}

fn non_blank(v: String) -> Option<String> {
    let t = v.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
