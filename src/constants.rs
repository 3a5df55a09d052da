//! Application-wide constants
//!
//! Settings keys, endpoint defaults and the identity sent with every request.

/// Settings key holding the OpenRouter API key.
pub const API_KEY_KEY: &str = "openrouter_api_key";

/// Settings key holding the chat-completions base URL.
pub const BASE_URL_KEY: &str = "openrouter_base_url";

/// Base URL used when none has been stored.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Model used for every action unless overridden in config.toml.
pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-nano";

/// Value of the `HTTP-Referer` header OpenRouter uses for app attribution.
pub const APP_REFERER: &str = "ai-scratchpad";

/// Value of the `X-Title` header OpenRouter uses for app attribution.
pub const APP_TITLE: &str = "AI Scratchpad";

/// Service name under which secrets live in the OS keyring.
pub const KEYRING_SERVICE: &str = "ai-scratchpad";

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "ai-scratchpad";

/// Environment variable overriding `storage.backend` from config.toml.
pub const ENV_STORAGE: &str = "SCRATCHPAD_STORAGE";
