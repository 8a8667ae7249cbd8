//! The `schoolhub init` command.

use std::path::Path;

use anyhow::Result;
use schoolhub_client::config::LOCAL_CONFIG_FILE;

pub fn execute() -> Result<()> {
    if Path::new(LOCAL_CONFIG_FILE).exists() {
        println!("{LOCAL_CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(LOCAL_CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {LOCAL_CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Set base_url in {LOCAL_CONFIG_FILE} and export SCHOOLHUB_TOKEN");
    println!("  2. Run: schoolhub notifications list");
    println!("  3. Run: schoolhub take --exercise <ID> --student <ID> --blank 1.1=...");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# schoolhub configuration

base_url = "http://localhost:5000/api"
token = "${SCHOOLHUB_TOKEN}"

# Seconds before a request is abandoned
timeout_secs = 30

# How often `notifications watch` refreshes the unread count
poll_interval_secs = 30

page_size = 20
"#;
