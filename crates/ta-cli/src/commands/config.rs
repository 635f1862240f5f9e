use anyhow::Result;
use ta_config::Config;
use ta_core::Provider;

use crate::cli::ConfigCommands;

pub fn handle(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config),
        ConfigCommands::Path => {
            println!("{}", Config::config_path().display());
            Ok(())
        }
        ConfigCommands::Validate => validate(config),
    }
}

fn show(config: &Config) -> Result<()> {
    println!("# {}", Config::config_path().display());
    print!("{}", toml::to_string_pretty(config)?);
    println!();
    for provider in [Provider::OpenAi, Provider::Claude] {
        let state = if config.ai.api_key(provider).is_some() {
            "set"
        } else {
            "not set"
        };
        println!("# {}: {state}", provider.api_key_var());
    }
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    let validation = config.validate();
    for warning in &validation.warnings {
        println!("! {warning}");
    }
    for issue in &validation.issues {
        println!("✗ {issue}");
    }

    if !validation.is_ok() {
        anyhow::bail!("configuration has {} issue(s)", validation.issues.len());
    }
    println!("✓ Configuration is valid");
    Ok(())
}
