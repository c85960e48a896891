//! `guildwarden onboard` — First-time setup.

use guildwarden_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🛡️  Guildwarden — First-Time Setup");
    println!("=================================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Add your bot token: edit {} or set DISCORD_BOT_TOKEN", config_path.display());
        println!("   2. Add your provider key: provider.api_key or OPENAI_API_KEY");
        println!("   3. Run: guildwarden run\n");
    }

    println!("🎉 Setup complete! Run `guildwarden doctor` to verify.\n");

    Ok(())
}
