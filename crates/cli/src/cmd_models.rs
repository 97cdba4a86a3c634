//! `maestro preset` and `maestro models ...`.

use maestro_protocol::{ModelPreset, Provider};
use maestro_session::api::model_listed;
use maestro_session::poll::{poll_until, PollOutcome};
use maestro_session::{ApiClient, SessionConfig};

pub async fn preset(api: &ApiClient, preset: ModelPreset) -> anyhow::Result<()> {
    api.set_model_preset(preset).await?;
    println!("Model preset set to {preset}");
    Ok(())
}

pub async fn status(api: &ApiClient, provider: Provider) -> anyhow::Result<()> {
    let response = api.provider_status(provider).await?;
    let online = response.is_ok();
    println!();
    println!(
        "  {provider}: {}",
        if online { "online" } else { "offline" }
    );
    if let Some(error) = &response.error {
        println!("  Error: {error}");
    }
    let models = response.model_names();
    if !models.is_empty() {
        println!("  Models: {}", models.join(", "));
    }
    println!();
    Ok(())
}

pub async fn list(api: &ApiClient, provider: Provider) -> anyhow::Result<()> {
    let models = api.provider_models(provider).await?;
    if models.is_empty() {
        println!("No models available from {provider}.");
    }
    for model in models {
        println!("{model}");
    }
    Ok(())
}

pub async fn pull(
    api: &ApiClient,
    config: &SessionConfig,
    model: &str,
    wait: bool,
) -> anyhow::Result<()> {
    api.pull_model(model).await?;
    println!("Pulling {model}...");
    if !wait {
        return Ok(());
    }

    let interval = config.pull_poll_interval();
    let ceiling = config.pull_poll_ceiling();
    let outcome = poll_until(interval, ceiling, move || async move {
        api.provider_models(Provider::Ollama)
            .await
            .map(|names| model_listed(&names, model))
            .unwrap_or(false)
    })
    .await;

    match outcome {
        PollOutcome::Ready => {
            println!("{model} is ready");
            Ok(())
        }
        PollOutcome::TimedOut => anyhow::bail!(
            "{model} did not appear within {}s; it may still be downloading",
            config.pull_poll_ceiling().as_secs()
        ),
    }
}
