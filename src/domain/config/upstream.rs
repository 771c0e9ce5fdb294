use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://abdullahalioo-remove-background.hf.space";
pub const DEFAULT_API_NAME: &str = "/predict";

/// Connection settings for the Gradio Space that removes backgrounds.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_name: String,
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    pub fetch_results: bool,
    pub token: Option<String>,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Endpoint name without the leading slash, as used in `/gradio_api/call/{name}`.
    pub fn endpoint(&self) -> &str {
        self.api_name.trim_start_matches('/')
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_name: DEFAULT_API_NAME.to_string(),
            timeout: None,
            max_retries: 0,
            fetch_results: true,
            token: None,
        }
    }
}
