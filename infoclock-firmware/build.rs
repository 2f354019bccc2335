//! Build script for infoclock-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates infoclock.conf at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use infoclock_core::config::Config;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Validate infoclock.conf at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=infoclock.conf");

    let config_path = Path::new("infoclock.conf");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: infoclock.conf not found!                                ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds its default settings from infoclock.conf.   ║\n\
            ║  Please create one in the infoclock-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let text = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read infoclock.conf                            ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config = match Config::parse(&text) {
        Ok(config) => config,
        Err(e) => fail(&format!("Cannot parse infoclock.conf: {:?}", e), &text),
    };

    if let Err(e) = config.validate() {
        fail(&format!("Setting out of range in infoclock.conf: {:?}", e), &text);
    }

    println!(
        "cargo:warning=infoclock.conf validated successfully ({} settings)",
        config.len()
    );
}

/// Abort the build with a boxed error and the offending lines
fn fail(message: &str, text: &str) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid settings                                         ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        ║  {:<64} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        message,
        format_lines(text)
    );
}

/// Format file lines with box drawing
fn format_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
