//! Loading the info card template.
//!
//! The registry publishes a YAML template describing the info card schema.
//! A local file can be supplied instead; otherwise the published template is
//! fetched once per run. Fetching goes through [`TemplateFetcher`] so tests
//! can substitute the network.

use super::manifest::ManifestTemplate;
use crate::error::SetupError;
use log::info;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Published location of the adapter info card template.
pub const DEFAULT_TEMPLATE_URL: &str =
    "https://raw.githubusercontent.com/Adapter-Hub/Hub/master/TEMPLATES/adapter.template.yaml";

/// Network timeout for template downloads.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A YAML file on disk.
    Local(PathBuf),
    /// A URL fetched over HTTP(S).
    Remote(String),
}

impl Default for TemplateSource {
    fn default() -> Self {
        Self::Remote(DEFAULT_TEMPLATE_URL.to_owned())
    }
}

/// Trait for downloading a template document.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateFetcher {
    /// Download `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the resource is missing.
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Errors arising from template downloads.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The template was not found (HTTP 404).
    #[error("template not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },
}

/// HTTP-based fetcher using `ureq`.
pub struct HttpFetcher;

impl TemplateFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Load and parse the template from `source`.
///
/// # Errors
///
/// Returns [`SetupError::TemplateNotFound`] or
/// [`SetupError::TemplateRead`] for local files,
/// [`SetupError::TemplateFetch`] for failed downloads, and
/// [`SetupError::InvalidTemplate`] when the document is not a YAML mapping.
pub fn load_template(
    source: &TemplateSource,
    fetcher: &dyn TemplateFetcher,
) -> Result<ManifestTemplate, SetupError> {
    let text = match source {
        TemplateSource::Local(path) => {
            if !path.is_file() {
                return Err(SetupError::TemplateNotFound { path: path.clone() });
            }
            std::fs::read_to_string(path).map_err(|source| SetupError::TemplateRead {
                path: path.clone(),
                source,
            })?
        }
        TemplateSource::Remote(url) => {
            info!("downloading info card template from {url}");
            fetcher.fetch(url)?
        }
    };
    ManifestTemplate::from_yaml(&text)
}
