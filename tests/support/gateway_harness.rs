use reqwest::StatusCode;
use std::time::Duration;
use streamchat::config::{Config, ProviderKind};
use streamchat::gateway::run_gateway_with_listener;
use wiremock::MockServer;

pub const GEMMA_PATH: &str = "/models/google/gemma-2b-it";
pub const MISTRAL_PATH: &str = "/models/mistralai/Mistral-Nemo-Instruct-2407";

/// Upstream body in the Hugging Face token-event format.
pub fn hf_sse(tokens: &[&str]) -> String {
    tokens
        .iter()
        .map(|text| {
            let event = serde_json::json!({"token": {"text": text, "special": false}});
            format!("data:{event}\n\n")
        })
        .collect()
}

/// Config pointing both inference and web search at `upstream`.
pub fn config_for(upstream: &MockServer) -> Config {
    let mut config = Config {
        provider: ProviderKind::Huggingface,
        api_key: Some("hf_test".into()),
        base_url: Some(upstream.uri()),
        ..Config::default()
    };
    config.observability.backend = "none".into();
    config.tools.search_endpoint = format!("{}/html/", upstream.uri());
    config
}

pub struct GatewayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl GatewayTestServer {
    pub async fn start(config: Config) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let handle = tokio::spawn(async move { run_gateway_with_listener(listener, config).await });
        wait_until_gateway_ready(port).await;

        Self { port, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_gateway_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("gateway did not become ready on port {port}");
}
