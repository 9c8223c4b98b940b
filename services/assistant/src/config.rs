//! Upstream gateway settings

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";
pub const DEFAULT_CITY: &str = "Nagpur";

#[derive(Clone)]
pub struct AssistantConfig {
    /// Bearer credential for the gateway. Requests fail while it is unset.
    pub api_key: Option<String>,
    pub gateway_url: String,
    pub model: String,
    /// City the assistant is scoped to in its instructions
    pub city: String,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("gateway_url", &self.gateway_url)
            .field("model", &self.model)
            .field("city", &self.city)
            .finish()
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AssistantConfig {
    /// Load the gateway settings
    ///
    /// # Environment Variables
    /// - `AI_GATEWAY_API_KEY`: gateway credential (no default)
    /// - `AI_GATEWAY_URL`: chat-completion endpoint
    /// - `AI_GATEWAY_MODEL`: model name sent upstream
    /// - `ASSISTANT_CITY`: city named in the instructions
    pub fn from_env() -> Self {
        let api_key = std::env::var("AI_GATEWAY_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        AssistantConfig {
            api_key,
            gateway_url: env_or("AI_GATEWAY_URL", DEFAULT_GATEWAY_URL),
            model: env_or("AI_GATEWAY_MODEL", DEFAULT_MODEL),
            city: env_or("ASSISTANT_CITY", DEFAULT_CITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "AI_GATEWAY_API_KEY",
        "AI_GATEWAY_URL",
        "AI_GATEWAY_MODEL",
        "ASSISTANT_CITY",
    ];

    fn clear() {
        for var in VARS {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = AssistantConfig::from_env();
        assert!(config.api_key.is_none());
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.city, DEFAULT_CITY);
    }

    #[test]
    #[serial]
    fn test_overrides_and_blank_key() {
        clear();
        unsafe {
            std::env::set_var("AI_GATEWAY_API_KEY", "   ");
            std::env::set_var("ASSISTANT_CITY", "Pune");
        }

        let config = AssistantConfig::from_env();
        assert!(config.api_key.is_none());
        assert_eq!(config.city, "Pune");

        unsafe { std::env::set_var("AI_GATEWAY_API_KEY", "sk-test") };
        let config = AssistantConfig::from_env();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert!(!format!("{:?}", config).contains("sk-test"));

        clear();
    }
}
