use anyhow::Result;
use ta_config::Config;
use ta_core::Category;
use ta_security::Redactor;

pub fn handle() -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Using default configuration");
        Config::default()
    });
    let enabled = config.redaction.enabled_categories();
    let redactor = Redactor::with_settings(config.redaction.settings());

    println!("Redaction categories (in rule order):");
    for category in Category::ALL {
        let mark = if enabled.contains(&category) { "✓" } else { "✗" };
        println!("  {mark} {:<12} {}", category.as_str(), category.label());
    }
    println!("\nBusiness lexicon: {}", redactor.lexicon_version());
    Ok(())
}
