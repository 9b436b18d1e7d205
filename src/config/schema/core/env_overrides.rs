use super::{Config, ProviderKind};
use std::str::FromStr;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) =
            std::env::var("STREAMCHAT_API_KEY").or_else(|_| std::env::var("HUGGINGFACE_API_KEY"))
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }

        if let Ok(provider) = std::env::var("STREAMCHAT_PROVIDER")
            && !provider.is_empty()
        {
            match ProviderKind::from_str(&provider) {
                Ok(kind) => self.provider = kind,
                Err(_) => tracing::warn!(provider = %provider, "Ignoring unknown STREAMCHAT_PROVIDER"),
            }
        }

        if let Ok(url) = std::env::var("STREAMCHAT_BASE_URL")
            && !url.is_empty()
        {
            self.base_url = Some(url);
        }

        if let Ok(port_str) =
            std::env::var("STREAMCHAT_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Ok(host) =
            std::env::var("STREAMCHAT_GATEWAY_HOST").or_else(|_| std::env::var("HOST"))
            && !host.is_empty()
        {
            self.gateway.host = host;
        }
    }
}
