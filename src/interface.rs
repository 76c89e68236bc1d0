use colored::*;

use crate::config::AppConfig;
use crate::logger::Logger;

/// Startup banner with the address to open and where the session log goes.
pub fn print_banner(config: &AppConfig, figures: usize, logger: Option<&Logger>) {
    println!("{}", "====================================".bright_cyan());
    println!("{}", format!("{:^36}", config.title.to_uppercase()).bright_cyan().bold());
    println!("{}", "====================================".bright_cyan());
    println!(
        " {} {}",
        "Dashboard:".bright_white(),
        format!("http://{}", config.addr()).bright_green()
    );
    println!(
        " {} {} (page size {})",
        "Initial tables:".bright_white(),
        figures,
        config.effective_page_size()
    );
    if let Some(logger) = logger {
        println!(
            " {} {}",
            "Session log:".bright_white(),
            logger.path().display().to_string().dimmed()
        );
    }
    println!("{}\n", " Press Ctrl-C to stop".dimmed());
}
