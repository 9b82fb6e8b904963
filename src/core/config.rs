//! Configuration for the map surface
//!
//! Credentials for the embedded SDK come from the environment; everything
//! else lives in [`SurfaceConfig`], whose defaults are the engine constants.
//! The values were tuned by hand, so they are exposed rather than derived.

use crate::core::{
    camera::clamp_zoom_level,
    constants::{
        DEFAULT_BASE_URL, DEFAULT_CENTER, DEFAULT_SDK_SCRIPT_URL, DEFAULT_ZOOM_LEVEL,
        FALLBACK_MAX_ZOOM, FALLBACK_MIN_ZOOM, FALLBACK_ZOOM_STEP, KEY_PREVIEW_LEN,
        MIN_COORDINATE_RANGE, PROJECTION_PADDING_RATIO, SDK_LOAD_TIMEOUT,
    },
    geo::LatLng,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the SDK application key
pub const APP_KEY_ENV: &str = "MAP_SDK_APP_KEY";
/// Older name for the same key, still honoured
pub const LEGACY_APP_KEY_ENV: &str = "MAP_SDK_JS_KEY";
/// Environment variable holding the base URL the document is served from
pub const BASE_URL_ENV: &str = "MAP_SDK_BASE_URL";

/// Application key and origin for the embedded SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkCredentials {
    pub app_key: Option<String>,
    pub base_url: String,
}

impl SdkCredentials {
    pub fn new(app_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let app_key = app_key.into();
        Self {
            app_key: (!app_key.trim().is_empty()).then_some(app_key),
            base_url: base_url.into(),
        }
    }

    /// Credentials with no key; booting with these fails immediately
    pub fn missing() -> Self {
        Self {
            app_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_key = lookup(APP_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .or_else(|| lookup(LEGACY_APP_KEY_ENV))
            .unwrap_or_default();
        let base_url = lookup(BASE_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(app_key, base_url)
    }

    pub fn has_key(&self) -> bool {
        self.app_key.is_some()
    }

    /// Short, log-safe form of the key
    pub fn key_preview(&self) -> String {
        match &self.app_key {
            Some(key) => {
                let prefix: String = key.chars().take(KEY_PREVIEW_LEN).collect();
                format!("{prefix}...")
            }
            None => "(missing)".to_string(),
        }
    }

    /// Full script URL for the SDK, `None` when no key is configured
    pub fn script_url(&self, sdk_script_url: &str) -> Option<String> {
        self.app_key
            .as_ref()
            .map(|key| format!("{sdk_script_url}?appkey={key}&autoload=false"))
    }
}

impl Default for SdkCredentials {
    fn default() -> Self {
        Self::missing()
    }
}

/// Continuous zoom range of the fallback renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomRange {
    /// Rounds to two decimals, then clamps. An inverted range pins to `max`.
    pub fn clamp(&self, zoom: f64) -> f64 {
        let rounded = (zoom * 100.0).round() / 100.0;
        rounded.max(self.min).min(self.max)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min > 0.0
            && self.min <= self.max
            && self.step.is_finite()
            && self.step > 0.0
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: FALLBACK_MIN_ZOOM,
            max: FALLBACK_MAX_ZOOM,
            step: FALLBACK_ZOOM_STEP,
        }
    }
}

/// Tunables shared by both rendering paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub sdk_load_timeout_ms: u64,
    pub sdk_script_url: String,
    pub default_zoom_level: u8,
    pub fallback_zoom: ZoomRange,
    pub padding_ratio: f64,
    pub min_coordinate_range: f64,
    pub fallback_center: LatLng,
}

impl SurfaceConfig {
    pub fn sdk_load_timeout(&self) -> Duration {
        Duration::from_millis(self.sdk_load_timeout_ms)
    }

    pub fn with_sdk_load_timeout(mut self, timeout: Duration) -> Self {
        self.sdk_load_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_fallback_zoom(mut self, range: ZoomRange) -> Self {
        self.fallback_zoom = range;
        self
    }

    pub fn with_default_zoom_level(mut self, level: i32) -> Self {
        self.default_zoom_level = clamp_zoom_level(level);
        self
    }

    /// Parses a JSON config, missing fields take their defaults
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        if !config.fallback_zoom.is_valid() {
            return Err(crate::MapError::Serialization(format!(
                "invalid fallback_zoom range {:?}",
                config.fallback_zoom
            )));
        }
        config.default_zoom_level = clamp_zoom_level(i32::from(config.default_zoom_level));
        Ok(config)
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            sdk_load_timeout_ms: SDK_LOAD_TIMEOUT.as_millis() as u64,
            sdk_script_url: DEFAULT_SDK_SCRIPT_URL.to_string(),
            default_zoom_level: DEFAULT_ZOOM_LEVEL,
            fallback_zoom: ZoomRange::default(),
            padding_ratio: PROJECTION_PADDING_RATIO,
            min_coordinate_range: MIN_COORDINATE_RANGE,
            fallback_center: LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_credentials_from_lookup() {
        let vars: HashMap<&str, &str> =
            [(LEGACY_APP_KEY_ENV, "abcdef123456"), (BASE_URL_ENV, "https://shop.example")]
                .into_iter()
                .collect();
        let creds = SdkCredentials::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(creds.app_key.as_deref(), Some("abcdef123456"));
        assert_eq!(creds.base_url, "https://shop.example");
        assert_eq!(creds.key_preview(), "abcdef...");
    }

    #[test]
    fn test_empty_key_is_missing() {
        let creds = SdkCredentials::from_lookup(|name| {
            (name == APP_KEY_ENV).then(|| "   ".to_string())
        });
        assert!(!creds.has_key());
        assert_eq!(creds.base_url, DEFAULT_BASE_URL);
        assert_eq!(creds.key_preview(), "(missing)");
        assert!(creds.script_url(DEFAULT_SDK_SCRIPT_URL).is_none());
    }

    #[test]
    fn test_script_url() {
        let creds = SdkCredentials::new("key42", "http://localhost");
        assert_eq!(
            creds.script_url("https://sdk.example/sdk.js").as_deref(),
            Some("https://sdk.example/sdk.js?appkey=key42&autoload=false")
        );
    }

    #[test]
    fn test_zoom_range_clamp() {
        let range = ZoomRange::default();
        assert_eq!(range.clamp(0.1), 0.8);
        assert_eq!(range.clamp(5.0), 2.2);
        assert_eq!(range.clamp(1.234), 1.23);
    }

    #[test]
    fn test_surface_config_from_json() {
        let config = SurfaceConfig::from_json(r#"{ "sdk_load_timeout_ms": 2500 }"#).unwrap();
        assert_eq!(config.sdk_load_timeout(), Duration::from_millis(2500));
        assert_eq!(config.default_zoom_level, DEFAULT_ZOOM_LEVEL);
        assert_eq!(config.fallback_zoom, ZoomRange::default());

        assert!(SurfaceConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_from_json_clamps_zoom_level() {
        let config = SurfaceConfig::from_json(r#"{ "default_zoom_level": 99 }"#).unwrap();
        assert_eq!(config.default_zoom_level, 14);
        let config = SurfaceConfig::from_json(r#"{ "default_zoom_level": 0 }"#).unwrap();
        assert_eq!(config.default_zoom_level, 1);
    }

    #[test]
    fn test_from_json_rejects_bad_zoom_range() {
        for range in [
            r#"{ "min": 2.2, "max": 0.8, "step": 0.2 }"#,
            r#"{ "min": 0.8, "max": 2.2, "step": 0.0 }"#,
            r#"{ "min": -1.0, "max": 2.2, "step": 0.2 }"#,
        ] {
            let json = format!(r#"{{ "fallback_zoom": {range} }}"#);
            assert!(
                matches!(SurfaceConfig::from_json(&json), Err(crate::MapError::Serialization(_))),
                "{range}"
            );
        }
    }

    #[test]
    fn test_inverted_range_clamp_does_not_panic() {
        let range = ZoomRange {
            min: 2.2,
            max: 0.8,
            step: 0.2,
        };
        assert_eq!(range.clamp(1.0), 0.8);
        assert_eq!(range.clamp(5.0), 0.8);
    }
}
