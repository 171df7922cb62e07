//! Terminal output formatting.

use anyhow::Result;
use boardstack_web::{MailMode, ServerConfig};
use colored::{ColoredString, Colorize};

fn on_off(enabled: bool) -> ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".dimmed()
    }
}

/// Print the startup banner.
pub fn print_banner(config: &ServerConfig) {
    let addr = config.bind_addr();
    let store = match &config.redis_url {
        Some(_) => "redis".yellow(),
        None => "in-memory".yellow(),
    };

    println!();
    println!("  {} {}", "BoardStack".cyan().bold(), "Web Server".bold());
    println!();
    println!("  {}          http://{}/api", "API".green(), addr);
    println!("  {}       http://{}/api/events?boardId=<id>", "Events".green(), addr);
    println!("  {}        {}", "Store".green(), store);
    println!(
        "  {} {}",
        "Registration".green(),
        on_off(config.enable_registration)
    );
    println!(
        "  {}         {}",
        "Mail".green(),
        on_off(config.mail == MailMode::Log)
    );
    println!(
        "  {}     {}",
        "Internal".green(),
        on_off(config.internal_token.is_some())
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();
}

/// Print the configuration as TOML, with the internal token masked.
pub fn print_config(config: &ServerConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.internal_token.is_some() {
        shown.internal_token = Some("********".to_string());
    }
    println!("{}", "# effective configuration".dimmed());
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
