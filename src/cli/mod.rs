mod chat;

use crate::catalog::ModelSummary;
use crate::client::ChatClient;
use crate::config::Config;
use crate::gateway;
use crate::ui::style;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `Streamchat` - streaming chat gateway with in-band tool calls.
#[derive(Parser, Debug)]
#[command(name = "streamchat")]
#[command(version = "0.1.0")]
#[command(about = "Streaming chat gateway and terminal client.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.streamchat/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with a running gateway from the terminal
    Chat {
        /// Gateway root URL (default: the configured gateway address)
        #[arg(long)]
        url: Option<String>,

        /// Catalog model id
        #[arg(short, long)]
        model: Option<String>,

        /// Let the model call web_search and url_fetch
        #[arg(long)]
        tools: bool,

        /// Single message mode (don't enter interactive mode)
        #[arg(short = 'M', long)]
        message: Option<String>,
    },

    /// List catalog models
    Models {
        /// Ask a running gateway instead of reading the local config
        #[arg(long)]
        url: Option<String>,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => {
                let mut config = Config::load_from(path)?;
                config.apply_env_overrides();
                Ok(config)
            }
            None => Config::load_or_init(),
        }
    }
}

fn gateway_url(config: &Config, url: Option<String>) -> String {
    url.unwrap_or_else(|| format!("http://{}:{}", config.gateway.host, config.gateway.port))
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let mut config = config;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(host) = host {
                config.gateway.host = host;
            }
            gateway::run_gateway(config).await
        }
        Commands::Chat {
            url,
            model,
            tools,
            message,
        } => {
            let client = ChatClient::new(&gateway_url(&config, url));
            chat::run(client, model, tools, message).await
        }
        Commands::Models { url } => {
            let models = match url {
                Some(url) => fetch_models(&url).await?,
                None => config.models.iter().map(ModelSummary::from).collect(),
            };
            print_models(&models);
            Ok(())
        }
    }
}

async fn fetch_models(url: &str) -> Result<Vec<ModelSummary>> {
    let endpoint = format!("{}/api/models", url.trim_end_matches('/'));
    reqwest::get(&endpoint)
        .await
        .with_context(|| format!("Failed to reach {endpoint}"))?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected /api/models response")
}

fn print_models(models: &[ModelSummary]) {
    for model in models {
        let status = if model.active {
            style::value("active")
        } else if model.coming_soon {
            style::dim("coming soon")
        } else {
            style::dim("inactive")
        };
        println!("{}  {}  ({status})", style::header(&model.id), model.name);
        if !model.description.is_empty() {
            println!("    {}", style::dim(&model.description));
        }
        if !model.features.is_empty() {
            println!("    {}", style::dim(model.features.join(", ")));
        }
    }
}
