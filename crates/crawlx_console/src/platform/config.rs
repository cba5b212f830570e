//! Console configuration: service URL and output directory.
//!
//! The service URL comes from `--api-url`, then `CRAWLX_API_URL` (clap reads
//! the variable after `.env` has been loaded), then the built-in default.

use std::path::PathBuf;

use crawlx_gateway::{GatewaySettings, DEFAULT_BASE_URL};

pub const API_URL_ENV: &str = "CRAWLX_API_URL";
pub const DEFAULT_OUTPUT_DIR: &str = "./downloads";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub gateway: GatewaySettings,
    pub output_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn resolve(api_url: Option<String>, output_dir: PathBuf) -> Self {
        let base_url = api_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            gateway: GatewaySettings {
                base_url,
                ..GatewaySettings::default()
            },
            output_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_falls_back_to_default() {
        let config = ConsoleConfig::resolve(None, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.output_dir, PathBuf::from("./downloads"));
    }

    #[test]
    fn blank_url_is_treated_as_missing() {
        let config = ConsoleConfig::resolve(Some("   ".into()), PathBuf::from("out"));
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn explicit_url_is_trimmed() {
        let config = ConsoleConfig::resolve(Some(" http://crawlx:9000 ".into()), PathBuf::from("out"));
        assert_eq!(config.gateway.base_url, "http://crawlx:9000");
    }
}
