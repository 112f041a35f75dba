//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);

            // Secrets are never serialized; report whether they are present.
            Output::kv("store.token", secret_state(settings.store.token.as_deref()));
            Output::kv("generator.api_key", secret_state(settings.generator.api_key.as_deref()));
            Output::kv(
                "generator (effective)",
                &settings.generator.effective_provider().to_string(),
            );
        }

        ConfigAction::Path => {
            let path = config_path
                .map(Settings::expand_path)
                .unwrap_or_else(Settings::default_config_path);
            println!("{}", path.display());
            if !path.exists() {
                Output::info("File does not exist; defaults and environment variables apply.");
            }
        }
    }

    Ok(())
}

fn secret_state(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.trim().is_empty() => "set",
        _ => "not set",
    }
}
