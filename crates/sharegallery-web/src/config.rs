use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use sharegallery_core::{ShareConfig, DEFAULT_THUMBNAIL_HEIGHT};

const DEFAULT_PORT: u16 = 3000;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub share: ShareConfig,
    /// Directory holding generated thumbnails
    pub cache_dir: PathBuf,
    /// Frontend assets, served for every non-API path
    pub static_dir: PathBuf,
    pub port: u16,
    pub thumbnail_height: u32,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let share = ShareConfig::from_lookup(&lookup);
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("SHAREGALLERY_PORT").and_then(|v| parse_setting::<u16>("SHAREGALLERY_PORT", &v));
        let thumbnail_height = get("SHAREGALLERY_THUMBNAIL_HEIGHT")
            .and_then(|v| parse_setting::<u32>("SHAREGALLERY_THUMBNAIL_HEIGHT", &v))
            .and_then(|h| {
                if h == 0 {
                    tracing::warn!("SHAREGALLERY_THUMBNAIL_HEIGHT must be positive, using default");
                    return None;
                }
                Some(h)
            });

        Self {
            share,
            cache_dir: get("SHAREGALLERY_CACHE_DIR").map_or_else(|| PathBuf::from("cache"), PathBuf::from),
            static_dir: get("SHAREGALLERY_STATIC").map_or_else(
                || PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
                PathBuf::from,
            ),
            port: port.unwrap_or(DEFAULT_PORT),
            thumbnail_height: thumbnail_height.unwrap_or(DEFAULT_THUMBNAIL_HEIGHT),
        }
    }
}

/// Parse a numeric setting, warning and yielding `None` when it is malformed
fn parse_setting<T>(key: &str, value: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .inspect_err(|e| tracing::warn!(value = %value, error = %e, "Invalid {key}, using default"))
        .ok()
}
