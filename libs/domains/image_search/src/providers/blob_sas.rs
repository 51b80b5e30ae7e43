//! Service SAS tokens for Azure Blob Storage, signed locally with the account key.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use core_config::{ConfigError, FromEnv, env_parse_or, env_required};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use url::Url;

use super::AssetAuthProvider;
use crate::error::{ImageSearchError, ImageSearchResult};

type HmacSha256 = Hmac<Sha256>;

/// Storage service version the signature is computed for.
pub const SAS_VERSION: &str = "2022-11-02";

const SAS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const MIN_TTL_MINUTES: u64 = 1;
/// Seven days.
const MAX_TTL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Clone)]
pub struct SasConfig {
    /// Base64 storage account key
    pub account_key: String,
    pub ttl: Duration,
}

impl std::fmt::Debug for SasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SasConfig")
            .field("account_key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl FromEnv for SasConfig {
    /// - ACCOUNT_KEY: required
    /// - SAS_TTL_MINUTES: defaults to 60, between 1 minute and 7 days
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_minutes = env_parse_or("SAS_TTL_MINUTES", 60u64)?;
        if !(MIN_TTL_MINUTES..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            return Err(ConfigError::ParseError {
                key: "SAS_TTL_MINUTES".to_string(),
                details: format!(
                    "must be between {} and {} minutes, got {}",
                    MIN_TTL_MINUTES, MAX_TTL_MINUTES, ttl_minutes
                ),
            });
        }

        Ok(Self {
            account_key: env_required("ACCOUNT_KEY")?,
            ttl: Duration::from_secs(ttl_minutes * 60),
        })
    }
}

/// Account, container and blob name addressed by a blob URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub account: String,
    pub container: String,
    pub blob: String,
}

impl BlobLocation {
    /// Parse `https://{account}.blob.core.windows.net/{container}/{blob}`.
    ///
    /// The blob name may contain `/` and is percent-decoded.
    pub fn parse(resource_url: &str) -> ImageSearchResult<Self> {
        let invalid = || ImageSearchError::InvalidBlobUrl(resource_url.to_string());

        let url = Url::parse(resource_url).map_err(|_| invalid())?;
        let account = url
            .host_str()
            .and_then(|host| host.split('.').next())
            .filter(|account| !account.is_empty())
            .ok_or_else(invalid)?
            .to_string();

        let mut segments = url.path_segments().ok_or_else(invalid)?;
        let container = segments
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(invalid)?
            .to_string();

        let blob = segments
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .map_err(|_| invalid())
            })
            .collect::<ImageSearchResult<Vec<_>>>()?
            .join("/");

        if blob.trim_matches('/').is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            account,
            container,
            blob,
        })
    }

    fn canonicalized_resource(&self) -> String {
        format!("/blob/{}/{}/{}", self.account, self.container, self.blob)
    }
}

/// Issues read-only blob service SAS tokens.
pub struct BlobSasSigner {
    key: Vec<u8>,
    ttl: chrono::Duration,
}

impl BlobSasSigner {
    pub fn new(config: SasConfig) -> ImageSearchResult<Self> {
        let key = STANDARD
            .decode(config.account_key.trim())
            .map_err(|e| ImageSearchError::Config(format!("ACCOUNT_KEY is not valid base64: {}", e)))?;
        let ttl_secs = config.ttl.as_secs();
        let in_range = (MIN_TTL_MINUTES * 60..=MAX_TTL_MINUTES * 60).contains(&ttl_secs);
        let ttl = chrono::Duration::from_std(config.ttl)
            .ok()
            .filter(|_| in_range)
            .ok_or_else(|| {
                ImageSearchError::Config(format!(
                    "SAS TTL must be between {} and {} minutes, got {}s",
                    MIN_TTL_MINUTES, MAX_TTL_MINUTES, ttl_secs
                ))
            })?;

        Ok(Self { key, ttl })
    }

    /// Token valid from `now` until `now + ttl`, returned as a query string.
    pub fn issue_read_token_at(
        &self,
        resource_url: &str,
        now: DateTime<Utc>,
    ) -> ImageSearchResult<String> {
        let location = BlobLocation::parse(resource_url)?;

        let start = now.format(SAS_TIME_FORMAT).to_string();
        let expiry = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ImageSearchError::Internal("SAS expiry out of range".to_string()))?
            .format(SAS_TIME_FORMAT)
            .to_string();
        let resource = location.canonicalized_resource();

        // permissions, start, expiry, resource, identifier, IP, protocol, version,
        // resource type, snapshot, encryption scope, then the five rs* overrides
        let string_to_sign = [
            "r",
            start.as_str(),
            expiry.as_str(),
            resource.as_str(),
            "",
            "",
            "",
            SAS_VERSION,
            "b",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ]
        .join("\n");

        let signature = self.sign(&string_to_sign)?;

        Ok(format!(
            "st={}&se={}&sp=r&sv={}&sr=b&sig={}",
            urlencoding::encode(&start),
            urlencoding::encode(&expiry),
            SAS_VERSION,
            urlencoding::encode(&signature)
        ))
    }

    fn sign(&self, string_to_sign: &str) -> ImageSearchResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| ImageSearchError::Internal(format!("Invalid HMAC key: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl AssetAuthProvider for BlobSasSigner {
    async fn issue_read_token(&self, resource_url: &str) -> ImageSearchResult<String> {
        self.issue_read_token_at(resource_url, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ACCOUNT_KEY: &str = "dGVzdC1hY2NvdW50LWtleS0wMTIzNDU2Nzg5";

    fn signer() -> BlobSasSigner {
        BlobSasSigner::new(SasConfig {
            account_key: ACCOUNT_KEY.to_string(),
            ttl: Duration::from_secs(3600),
        })
        .unwrap()
    }

    #[test]
    fn test_parse_blob_location() {
        let location =
            BlobLocation::parse("https://myaccount.blob.core.windows.net/images/cars/red%20car.jpg")
                .unwrap();
        assert_eq!(location.account, "myaccount");
        assert_eq!(location.container, "images");
        assert_eq!(location.blob, "cars/red car.jpg");
    }

    #[test]
    fn test_parse_rejects_urls_without_blob() {
        for url in [
            "https://myaccount.blob.core.windows.net/images",
            "https://myaccount.blob.core.windows.net/images/",
            "https://myaccount.blob.core.windows.net/",
            "not a url",
        ] {
            assert!(
                matches!(BlobLocation::parse(url), Err(ImageSearchError::InvalidBlobUrl(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_signed_token_is_deterministic_for_fixed_time() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let token = signer()
            .issue_read_token_at(
                "https://myaccount.blob.core.windows.net/images/cars/red%20car.jpg",
                now,
            )
            .unwrap();

        assert_eq!(
            token,
            "st=2024-05-01T12%3A00%3A00Z&se=2024-05-01T13%3A00%3A00Z&sp=r&sv=2022-11-02&sr=b\
             &sig=jAbMGbYNSjzLBXmvOsInGKrDRHZDE8qVCFT%2FrLS9wH4%3D"
        );
    }

    #[test]
    fn test_invalid_account_key_is_config_error() {
        let result = BlobSasSigner::new(SasConfig {
            account_key: "not base64!".to_string(),
            ttl: Duration::from_secs(60),
        });
        assert!(matches!(result, Err(ImageSearchError::Config(_))));
    }

    #[test]
    fn test_signer_rejects_ttl_outside_range() {
        for ttl in [
            Duration::ZERO,
            Duration::from_secs(30),
            Duration::from_secs(8 * 24 * 3600),
            Duration::from_secs(60_000_000_000_000),
        ] {
            let result = BlobSasSigner::new(SasConfig {
                account_key: ACCOUNT_KEY.to_string(),
                ttl,
            });
            assert!(
                matches!(result, Err(ImageSearchError::Config(_))),
                "{ttl:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_signer_accepts_seven_day_ttl() {
        let signer = BlobSasSigner::new(SasConfig {
            account_key: ACCOUNT_KEY.to_string(),
            ttl: Duration::from_secs(7 * 24 * 3600),
        })
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let token = signer
            .issue_read_token_at("https://myaccount.blob.core.windows.net/images/a.jpg", now)
            .unwrap();
        assert!(token.contains("se=2024-05-08T12%3A00%3A00Z"));
    }

    #[test]
    fn test_from_env_rejects_zero_and_oversized_ttl() {
        for minutes in ["0", "10081", "1000000000000"] {
            temp_env::with_vars(
                [("ACCOUNT_KEY", Some(ACCOUNT_KEY)), ("SAS_TTL_MINUTES", Some(minutes))],
                || {
                    let err = SasConfig::from_env().unwrap_err();
                    assert!(err.to_string().contains("SAS_TTL_MINUTES"), "{minutes}: {err}");
                },
            );
        }
    }

    #[test]
    fn test_from_env_defaults_to_one_hour() {
        temp_env::with_vars(
            [("ACCOUNT_KEY", Some(ACCOUNT_KEY)), ("SAS_TTL_MINUTES", None)],
            || {
                let config = SasConfig::from_env().unwrap();
                assert_eq!(config.ttl, Duration::from_secs(3600));
            },
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = SasConfig {
            account_key: ACCOUNT_KEY.to_string(),
            ttl: Duration::from_secs(60),
        };
        assert!(!format!("{config:?}").contains(ACCOUNT_KEY));
    }

    #[tokio::test]
    async fn test_trait_issues_token_for_now() {
        let token = signer()
            .issue_read_token("https://myaccount.blob.core.windows.net/images/a.jpg")
            .await
            .unwrap();
        assert!(token.contains("sp=r"));
        assert!(token.contains("&sig="));
    }
}
