use anyhow::Result;
use clap::Args;
use colored::Colorize;
use stagehand_core::{ReconcilerConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Enable same-turn update coalescing in the written config
    #[arg(short, long)]
    pub coalesce: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Stagehand config...".bright_blue().bold());

    let config = ReconcilerConfig::default().with_coalescing(args.coalesce);
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!("    coalesceUpdates: {}", config.coalesce_updates);
    println!("    maxDepth:        {}", config.max_depth);
    println!("    maxFlushTurns:   {}", config.max_flush_turns);
    println!();
    println!("Next steps:");
    println!("  1. Tune {}", DEFAULT_CONFIG_NAME);
    println!("  2. Run: stagehand demo --steps 5");

    Ok(())
}
