use clap::Parser;
use reqwest::Method;
use salon_client::config::{validate_provider, Command};
use salon_client::core::preferences::{resolve_phone_country, set_phone_country};
use salon_client::core::ConfigProvider;
use salon_client::utils::error::ErrorSeverity;
use salon_client::utils::logger;
use salon_client::{
    build_api_url, build_websocket_url, install_api_namespace_interceptor, resolve_api_endpoint,
    ApiClient, CliConfig, FileStore, ReconnectingSocket, Result, SalonError, TomlConfig, TtlCache,
};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 載入 TOML 配置 (若有指定)
    let toml_config = match cli.config.as_deref().map(TomlConfig::from_file).transpose() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match &toml_config {
        Some(config) if config.json_logs() => logger::init_json_logger(config.log_level()),
        _ if cli.json_logs => logger::init_json_logger(if cli.verbose { "debug" } else { "info" }),
        _ => logger::init_cli_logger(cli.verbose),
    }

    let config: &dyn ConfigProvider = match &toml_config {
        Some(config) => config,
        None => &cli,
    };

    // 驗證配置
    if let Err(e) = validate_provider(config) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    install_api_namespace_interceptor(config);
    tracing::debug!("API base: {}", config.api_base_url());

    if let Err(e) = run(&cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(command: &Command, config: &dyn ConfigProvider) -> Result<()> {
    match command {
        Command::Resolve { endpoint } => println!("{}", resolve_api_endpoint(endpoint)),
        Command::Url { endpoint } => println!("{}", build_api_url(endpoint, config.api_base_url())),
        Command::WsUrl { endpoint } => {
            let base = config.ws_base_url().unwrap_or(config.api_base_url());
            println!("{}", build_websocket_url(endpoint, base));
        }
        Command::Call {
            method,
            endpoint,
            body,
            token,
        } => {
            let client = ApiClient::from_config(config, FileStore::new(config.storage_dir()))?;
            if let Some(token) = token {
                client.set_token(token).await?;
            }

            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
                SalonError::ValidationError {
                    message: format!("'{}' is not an HTTP method", method),
                }
            })?;
            let body = body.as_deref().map(serde_json::from_str::<Value>).transpose()?;

            let response: Value = client.api_call(method, endpoint, body.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::CacheGet {
            endpoint,
            ttl_seconds,
        } => {
            let client = ApiClient::from_config(config, FileStore::new(config.storage_dir()))?;
            let ttl = ttl_seconds.map(Duration::from_secs);
            let response: Value = client.get_cached(endpoint, ttl).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::CacheClear => {
            let cache = TtlCache::new(FileStore::new(config.storage_dir()), config.cache_ttl());
            let removed = cache.clear().await?;
            println!("🧹 Removed {} cached entries", removed);
        }
        Command::Listen {
            endpoint,
            max_messages,
        } => listen(config, endpoint, *max_messages).await?,
        Command::PhoneCountry { set } => {
            let store = FileStore::new(config.storage_dir());
            if let Some(code) = set {
                set_phone_country(&store, code).await?;
            }
            let http = reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()?;
            let code = resolve_phone_country(
                &store,
                &http,
                config.geo_endpoint(),
                config.default_phone_country(),
            )
            .await;
            println!("{}", code);
        }
    }
    Ok(())
}

async fn listen(config: &dyn ConfigProvider, endpoint: &str, max_messages: Option<usize>) -> Result<()> {
    let socket = ReconnectingSocket::for_endpoint(config, endpoint);
    tracing::info!("🔌 Listening on {}", socket.url());

    let mut inbound = socket.subscribe();
    socket.connect();

    let mut health = tokio::time::interval(Duration::from_millis(500));
    let mut received = 0usize;

    loop {
        tokio::select! {
            message = inbound.recv() => match message {
                Ok(message) => {
                    println!("{}", serde_json::to_string(&message)?);
                    received += 1;
                    if max_messages.is_some_and(|max| received >= max) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} messages, consumer too slow", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = health.tick() => {
                if !socket.is_active() {
                    socket.disconnect();
                    return Err(SalonError::WebSocketError(
                        tokio_tungstenite::tungstenite::Error::ConnectionClosed,
                    ));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing connection");
                break;
            }
        }
    }

    socket.disconnect();
    tracing::info!("✅ Received {} messages", received);
    Ok(())
}
