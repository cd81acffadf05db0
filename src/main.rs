use tech_compass::config::AppConfig;
use tracing_subscriber::EnvFilter;

/// Defaults compiled into the binary for builds that ship without a `.env`.
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

/// Where the environment defaults were read from.
#[derive(Debug)]
enum EnvSource {
    DotEnv,
    Bundled,
}

/// Fill unset variables from `.env`, or from the bundled defaults when there
/// is no `.env` to read. Variables already in the environment always win.
fn load_environment() -> Result<EnvSource, dotenvy::Error> {
    #[cfg(not(target_arch = "wasm32"))]
    if dotenvy::dotenv().is_ok() {
        return Ok(EnvSource::DotEnv);
    }
    dotenvy::from_read(BUNDLED_CONFIG.as_bytes())?;
    Ok(EnvSource::Bundled)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let source = load_environment();
    init_tracing();
    match source {
        Ok(source) => tracing::debug!(?source, "environment defaults loaded"),
        Err(err) => tracing::warn!(error = %err, "bundled config could not be parsed"),
    }

    let config = AppConfig::from_env().map_err(|err| {
        tracing::error!(error = %err, "refusing to start");
        err
    })?;
    tracing::info!(model = %config.model, "starting Tech Compass");

    dioxus::LaunchBuilder::new()
        .with_context(config)
        .launch(tech_compass::ui::App);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_config_parses() {
        let pairs: Vec<(String, String)> = dotenvy::from_read_iter(BUNDLED_CONFIG.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(pairs.contains(&("TECH_COMPASS_MODEL".to_string(), "gemini-2.5-flash".to_string())));
        assert!(pairs.iter().all(|(key, _)| key != "API_KEY"));
    }
}
