//! `brewline config`: Configuration management commands.

use brewline_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:     {}", config.model);
            println!("   Endpoint:  {}", config.completion.base_url);
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
            println!("   History:   {} turns", config.memory.history_cap());
            println!(
                "   Knowledge: {}",
                if config.knowledge.enabled {
                    config.knowledge.store_path.display().to_string()
                } else {
                    "disabled".into()
                }
            );
            println!(
                "   Privacy:   {}",
                if config.privacy.enabled {
                    config.privacy.engine.as_str()
                } else {
                    "disabled"
                }
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Non-fatal problems worth telling the operator about.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if !config.has_api_key() {
        warnings.push("No API key set (set BREWLINE_API_KEY or GROQ_API_KEY env var)");
    }

    if config.knowledge.enabled && !config.knowledge.store_path.is_file() {
        warnings.push("Knowledge store not built yet; run `brewline index`");
    }

    if !matches!(config.privacy.engine.as_str(), "presidio" | "pattern") {
        warnings.push("Unknown privacy.engine; PII masking will be disabled");
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    // Never echo the key
    config.api_key = None;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn defaults() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::default_toml());
    Ok(())
}
