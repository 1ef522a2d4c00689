//! `tessera config`: Configuration management commands.

use anyhow::Context;
use tessera_config::AppConfig;

pub fn show(defaults: bool) -> anyhow::Result<()> {
    if defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = AppConfig::load().context("Failed to load config")?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() {
    println!("{}", AppConfig::config_dir().join("config.toml").display());
}

pub fn validate() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Configuration is invalid")?;
    let mut warnings = Vec::new();

    if config.context.input_entry.reserved_tokens as i64 > config.context.token_budget {
        warnings.push("context.input_entry.reserved_tokens exceeds context.token_budget");
    }
    if config.memory.long_term == 0 {
        warnings.push("memory.long_term is 0; recall will always be empty");
    }

    println!("Config OK");
    for warning in &warnings {
        println!("  warning: {warning}");
    }
    println!("  token budget:  {}", config.context.token_budget);
    println!("  cascade depth: {}", config.context.max_cascade_depth);
    println!("  budget mode:   {:?}", config.context.budget_mode);
    println!("  bot name:      {}", config.chatbot.name);
    Ok(())
}
