use thiserror::Error;
use url::Url;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MAX_TIMEOUT_SECS: u64 = 300;

/// Validated connection settings for the course API collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiSettings {
    base_url: Url,
    token: Option<String>,
    timeout_secs: u64,
}

/// Raw settings as read from the environment or command line.
#[derive(Clone, Debug, Default)]
pub struct ApiSettingsDraft {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiSettingsError {
    #[error("API base URL is not configured")]
    MissingBaseUrl,

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("request timeout must be between 1 and 300 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("cannot build endpoint `{path}`")]
    InvalidEndpoint { path: String },
}

impl ApiSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// The base URL always ends with `/` afterwards so relative endpoints keep
    /// any path prefix (e.g. `https://host/api/`).
    ///
    /// # Errors
    ///
    /// Returns `ApiSettingsError` if the URL is missing, unparsable or not
    /// http(s), or if the timeout is out of range.
    pub fn validate(self) -> Result<ApiSettings, ApiSettingsError> {
        let raw = normalize_optional(self.base_url).ok_or(ApiSettingsError::MissingBaseUrl)?;
        let with_slash = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        let base_url =
            Url::parse(&with_slash).map_err(|_| ApiSettingsError::InvalidBaseUrl(with_slash.clone()))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiSettingsError::InvalidBaseUrl(with_slash));
        }

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if !(1..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ApiSettingsError::InvalidTimeout(timeout_secs));
        }

        Ok(ApiSettings {
            base_url,
            token: normalize_optional(self.token),
            timeout_secs,
        })
    }
}

impl ApiSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Resolve a relative endpoint path (no leading slash) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiSettingsError::InvalidEndpoint` if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiSettingsError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiSettingsError::InvalidEndpoint {
                path: path.to_owned(),
            })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(url: &str) -> ApiSettingsDraft {
        ApiSettingsDraft {
            base_url: Some(url.to_owned()),
            ..ApiSettingsDraft::default()
        }
    }

    #[test]
    fn base_url_keeps_its_path_prefix() {
        let settings = draft("http://localhost:8000/api").validate().unwrap();
        let url = settings.endpoint("/courses/3/modules").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/courses/3/modules");
        assert_eq!(settings.timeout_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        let err = ApiSettingsDraft {
            base_url: Some("   ".into()),
            ..ApiSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ApiSettingsError::MissingBaseUrl);

        let settings = ApiSettingsDraft {
            token: Some("  ".into()),
            ..draft("https://example.com")
        }
        .validate()
        .unwrap();
        assert_eq!(settings.token(), None);
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert!(matches!(
            draft("ftp://example.com").validate(),
            Err(ApiSettingsError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            draft("not a url").validate(),
            Err(ApiSettingsError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn timeout_range_is_enforced() {
        let err = ApiSettingsDraft {
            timeout_secs: Some(0),
            ..draft("https://example.com")
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ApiSettingsError::InvalidTimeout(0));
    }
}
