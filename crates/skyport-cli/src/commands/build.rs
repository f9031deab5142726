use anyhow::Result;
use colored::Colorize;
use skyport::{Builder, Config};
use std::path::Path;

pub fn execute(root: &Path, config: Config) -> Result<()> {
    let target = config.build.target;

    println!("{}", "Building functions...".green().bold());
    println!();
    println!("Target: {}", target.as_str().cyan());
    println!();

    let report = Builder::new(root, config).build()?;

    for diagnostic in &report.diagnostics {
        println!("  {} Skipped {}", "⚠".yellow(), diagnostic);
    }
    for conflict in &report.conflicts {
        println!(
            "  {} {} {} defined in several files, using {}",
            "⚠".yellow(),
            conflict.method,
            conflict.route,
            conflict.kept.display()
        );
    }

    if report.is_empty() {
        println!("{}", "⚠ No routes or subscribers found, nothing was built".yellow());
        return Ok(());
    }

    println!();
    println!(
        "{} Built {} route handlers and {} subscribers",
        "✓".green(),
        report.routes,
        report.subscribers
    );
    println!("  {} {}", "Output:".cyan(), report.output_dir.display());

    Ok(())
}
