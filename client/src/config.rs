use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.bannergress.com";
pub const BANNERS_PATH: &str = "bannergress/banners";
pub const USER_AGENT: &str = "banner-map/0.1";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_EVENT_BUFFER: usize = 64;
pub const DEFAULT_ZOOM_SETTLE_MS: u64 = 100;

// Map view
pub const DEFAULT_MAP_WIDTH_PX: u32 = 1280;
pub const DEFAULT_MAP_HEIGHT_PX: u32 = 800;
pub const ZOOM_TO_BANNER_MAX_ZOOM: u8 = 15;
pub const MAX_ZOOM: u8 = 19;

pub fn api_base_url() -> String {
    std::env::var("BANNER_API_URL")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
}

pub fn http_timeout() -> Duration {
    std::env::var("BANNER_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
}

pub fn connect_timeout() -> Duration {
    std::env::var("BANNER_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
}

pub fn event_buffer() -> usize {
    std::env::var("BANNER_EVENT_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_EVENT_BUFFER)
}

/// Delay before fitting the map to a banner, letting the layout settle.
/// Zero is allowed here and disables the delay.
pub fn zoom_settle_delay() -> Duration {
    std::env::var("BANNER_ZOOM_SETTLE_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_ZOOM_SETTLE_MS))
}
