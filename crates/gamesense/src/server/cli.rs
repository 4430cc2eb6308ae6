use crate::guide::DEFAULT_MAX_PAGE_BYTES;
use crate::model::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use gamesense_core::guide::DEFAULT_MAX_GUIDE_CHARS;
use gamesense_core::payload::DEFAULT_MAX_INPUT_CHARS;

#[derive(Debug, Clone, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "GAMESENSE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Timeout for a single model call, in seconds
    #[arg(long, env = "GEMINI_TIMEOUT", default_value = "120")]
    pub model_timeout: u64,

    /// Total attempts per model call, the first one included
    #[arg(
        long,
        env = "GEMINI_MAX_ATTEMPTS",
        default_value = "5",
        value_parser = clap::value_parser!(u32).range(1..=5)
    )]
    pub max_attempts: u32,

    /// Maximum characters kept from each guide page
    #[arg(long, env = "GUIDE_MAX_CHARS", default_value_t = DEFAULT_MAX_GUIDE_CHARS)]
    pub max_guide_chars: usize,

    /// Maximum characters sent to the model per request
    #[arg(long, env = "GAMESENSE_MAX_INPUT_CHARS", default_value_t = DEFAULT_MAX_INPUT_CHARS)]
    pub max_input_chars: usize,

    /// Guide pages fetched at the same time for one request
    #[arg(long, env = "GUIDE_CONCURRENCY", default_value = "4")]
    pub fetch_concurrency: usize,

    /// Timeout for a single guide page, in seconds
    #[arg(long, env = "GUIDE_TIMEOUT", default_value = "10")]
    pub fetch_timeout: u64,

    /// Largest guide page body read, in bytes
    #[arg(long, env = "GUIDE_MAX_BYTES", default_value_t = DEFAULT_MAX_PAGE_BYTES)]
    pub max_page_bytes: usize,

    /// Time budget for all guide pages of one request, in seconds
    #[arg(long, env = "GUIDE_DEADLINE", default_value = "20")]
    pub fetch_deadline: u64,
}
