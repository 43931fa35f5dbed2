use std::sync::Arc;

use futures::StreamExt;

use finguard::channels::{Channel, CliChannel, TelegramChannel};
use finguard::config::BotConfig;
use finguard::flow::FlowEngine;
use finguard::recommend::{GroqProvider, RecommendationProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export GROQ_API_KEY=gsk_...");
            std::process::exit(1);
        }
    };

    eprintln!("🤖 FinGuard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);

    let BotConfig {
        telegram_token,
        allowed_users,
        api_key,
        model,
        request_timeout,
    } = config;

    let provider: Arc<dyn RecommendationProvider> =
        Arc::new(GroqProvider::new(api_key, model, request_timeout)?);
    let engine = Arc::new(FlowEngine::new(provider));

    // Set up channels
    let mut channels: Vec<Arc<dyn Channel>> = vec![Arc::new(CliChannel::new())];
    let mut active_channels = vec!["cli"];

    if let Some(token) = telegram_token {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if allowed_users.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else if allowed_users.is_empty() {
                "none (deny all)".to_string()
            } else {
                allowed_users.join(", ")
            }
        );
        channels.push(Arc::new(TelegramChannel::new(token, allowed_users)));
        active_channels.push("telegram");
    }

    eprintln!("   Channels: {}", active_channels.join(", "));
    eprintln!("   Send /start to begin. Ctrl+C to stop.\n");

    // One task per channel; one task per event. Per-user ordering is held
    // by the engine's fair session lock, so a slow recommendation call for
    // one user never stalls another.
    let mut tasks = Vec::new();
    for channel in channels {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            let mut stream = match channel.start().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(channel = channel.name(), error = %e, "channel failed to start");
                    return;
                }
            };

            while let Some(event) = stream.next().await {
                let engine = Arc::clone(&engine);
                let channel = Arc::clone(&channel);
                tokio::spawn(async move {
                    for out in engine.handle(&event.user_id, &event.payload).await {
                        if let Err(e) = channel.respond(&event, out).await {
                            tracing::warn!(
                                channel = channel.name(),
                                error = %e,
                                "failed to send response"
                            );
                        }
                    }
                });
            }
            tracing::info!(channel = channel.name(), "channel stream ended");
        }));
    }

    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}
