use anyhow::{Context, Result};

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key. Required; startup fails without it.
    pub api_key: String,
    /// HTTP listen port.
    pub port: u16,
    /// Gemini model name used for analysis and chat.
    pub model: String,
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable not set")?;

        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", value))?,
            Err(_) => default_port(),
        };

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| default_model());

        Ok(Self {
            api_key,
            port,
            model,
        })
    }
}
