use anyhow::{Context, Result};
use colored::Colorize;
use skyport::{discover, Config};
use std::path::Path;

pub fn execute(root: &Path, config: &Config, json: bool) -> Result<()> {
    let discovery = discover(root, config)?;

    if json {
        let output =
            serde_json::to_string_pretty(&discovery).context("Failed to serialize routes")?;
        println!("{}", output);
        return Ok(());
    }

    println!("{}", "Routes:".cyan().bold());
    if discovery.resolution.routes.is_empty() {
        println!("  (none)");
    }
    for route in &discovery.resolution.routes {
        println!(
            "  {:<8} {:<32} {}#{}",
            route.method.as_str().green(),
            route.route,
            route.file.display(),
            route.export_name
        );
    }

    println!();
    println!("{}", "Subscribers:".cyan().bold());
    if discovery.subscribers.is_empty() {
        println!("  (none)");
    }
    for subscriber in &discovery.subscribers {
        println!(
            "  {} {:<32} {}#{}",
            "→".green(),
            subscriber.name,
            subscriber.file.display(),
            subscriber.entry_export().unwrap_or("-")
        );
    }

    if !discovery.resolution.conflicts.is_empty() || !discovery.diagnostics.is_empty() {
        println!();
    }
    for conflict in &discovery.resolution.conflicts {
        println!(
            "  {} {} {} also exported by {:?}",
            "⚠".yellow(),
            conflict.method,
            conflict.route,
            conflict.dropped
        );
    }
    for diagnostic in &discovery.diagnostics {
        println!("  {} Skipped {}", "⚠".yellow(), diagnostic);
    }

    Ok(())
}
