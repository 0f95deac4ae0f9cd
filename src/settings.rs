use crate::gauge::GaugeConfig;
use std::time::Duration;

pub const PING_URL: &str = "https://www.google.com";
pub const DOWNLOAD_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.6.0/jquery.min.js";
pub const UPLOAD_URL: &str = "https://httpbin.org/post";

pub const UPLOAD_CHUNK_SIZE: usize = 50 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub ping_url: String,
    pub download_url: String,
    pub upload_url: String,
    pub download_duration: Duration,
    pub upload_duration: Duration,
    pub upload_chunk_size: usize,
    pub gauge: GaugeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ping_url: PING_URL.to_string(),
            download_url: DOWNLOAD_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
            download_duration: Duration::from_secs(10),
            upload_duration: Duration::from_secs(10),
            upload_chunk_size: UPLOAD_CHUNK_SIZE,
            gauge: GaugeConfig::default(),
        }
    }
}

impl Settings {
    pub fn max_speed(&self) -> f64 {
        self.gauge.max_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_budgets() {
        let settings = Settings::default();
        assert_eq!(settings.download_duration, Duration::from_secs(10));
        assert_eq!(settings.upload_duration, Duration::from_secs(10));
        assert_eq!(settings.upload_chunk_size, 51_200);
        assert_eq!(settings.max_speed(), 100.0);
    }
}
