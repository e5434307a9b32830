//! Startup banner and URL display

use super::config::is_all_interfaces;
use super::constants::{API_PREFIX, APP_NAME};
use crate::data::sql::Backend;

/// Print the startup banner with URLs
pub fn print_banner(host: &str, port: u16, backend: Backend, database: &str, resources: &[&str]) {
    // Use localhost for display when binding to all interfaces
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    const W: usize = 11;

    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m \x1b[36mhttp://{}:{}{}\x1b[0m",
        "API:", display_host, port, API_PREFIX
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Resources:",
        if resources.is_empty() {
            "(none configured)".to_string()
        } else {
            resources.join(", ")
        }
    );

    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }
    println!("  \x1b[90m➜  {:<W$} {} ({})\x1b[0m", "Database:", database, backend);

    println!();
}
