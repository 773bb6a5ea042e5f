//! CLI subcommand handlers for quaver.
//!
//! Functions live here to keep main.rs focused on argument parsing and
//! routing.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use crate::config::loader::{get_config_path, load_config, save_config};
use crate::config::schema::Config;

pub(crate) fn cmd_onboard(force: bool) {
    let config_path = get_config_path();

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        print!("Overwrite? [y/N] ");
        io::stdout().flush().ok();
        let mut input = String::new();
        io::stdin().read_line(&mut input).ok();
        if !input.trim().eq_ignore_ascii_case("y") {
            return;
        }
    }

    let config = Config::default();
    save_config(&config, None);
    println!("  Created config at {}", config_path.display());

    let media = config.media_path();
    println!("  Media directory at {}", media.display());

    println!("\nquaver is ready!");
    println!("\nNext steps:");
    println!("  1. Set bot.ownerId in the config to unlock owner commands");
    println!("  2. Run: quaver run");
    println!("  3. Type !help at the prompt");
}

pub(crate) fn cmd_run(verbose: bool) {
    if verbose {
        eprintln!("Verbose mode enabled");
    }

    let config = load_config(None);
    println!(
        "Starting quaver with prefix '{}'...",
        config.bot.command_prefix
    );

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    if let Err(e) = runtime.block_on(crate::runtime::run(config)) {
        eprintln!("quaver exited with error: {e:#}");
    }
}

pub(crate) fn cmd_status() {
    let config_path = get_config_path();
    let config = load_config(None);
    let media = config.media_path();

    println!("quaver Status\n");
    println!(
        "Config: {} [{}]",
        config_path.display(),
        if config_path.exists() {
            "ok"
        } else {
            "missing"
        }
    );
    println!(
        "Media: {} [{}]",
        media.display(),
        if media.exists() { "ok" } else { "missing" }
    );
    println!("Prefix: {}", config.bot.command_prefix);
    println!(
        "Owner: {}",
        config.bot.owner_id.as_deref().unwrap_or("not set")
    );
    println!(
        "Console gateway: {}",
        if config.gateways.console.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    println!("\nExternal tools:");
    for binary in [
        config.resolver.binary.as_str(),
        "ffmpeg",
        "paplay",
        config.latex.pdflatex_binary.as_str(),
        config.latex.pdftoppm_binary.as_str(),
    ] {
        println!("  {}: {}", binary, tool_status(binary));
    }
}

/// Whether `binary` can be spawned from PATH.
fn tool_status(binary: &str) -> &'static str {
    let spawned = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match spawned {
        Ok(_) => "found",
        Err(_) => "missing",
    }
}
