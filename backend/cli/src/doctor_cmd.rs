//! `paperforge doctor`: configuration and dependency checks.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use paperforge_config::{load_with_warnings, AppConfig};
use paperforge_understanding::{GeminiClient, PdfToText};

use crate::wiring::rebuild_tool;

/// Run every check and print a report. Returns whether the setup is usable.
pub async fn run(env: &HashMap<String, String>, config_file: Option<&Path>) -> Result<bool> {
    println!("\n🔍 Running PaperForge Doctor...\n");

    println!("Checking Configuration:");
    if let Some(path) = config_file {
        println!("  ⚪ config file: {}", path.display());
    }
    let config = match load_with_warnings(env, config_file).await {
        Ok((config, warnings)) => {
            println!("  🟢 configuration is valid");
            for warning in warnings {
                println!("  🟡 {}: {}", warning.path, warning.message);
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&config.redacted()).unwrap_or_default()
            );
            config
        }
        Err(e) => {
            println!("  🔴 {e:#}");
            println!("\n❌ Configuration must be fixed before other checks can run.");
            return Ok(false);
        }
    };

    let mut healthy = true;
    check_folders(&config);
    check_pdftotext(&config).await;
    healthy &= check_rebuilder(&config).await;
    healthy &= check_gemini(&config).await;

    println!();
    if healthy {
        println!("✅ All checks passed! PaperForge is ready.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }
    Ok(healthy)
}

fn check_folders(config: &AppConfig) {
    println!("\nChecking Folders:");
    let folders = &config.folders;
    for (label, path) in [
        ("inbox", &folders.inbox),
        ("processed", &folders.processed),
        ("error", &folders.error),
        ("working", &folders.working),
    ] {
        if path.is_dir() {
            println!("  🟢 {label}: {}", path.display());
        } else {
            println!("  🟡 {label}: {} (created at startup)", path.display());
        }
    }
}

/// Missing pdftotext is survivable: every document then goes to remote OCR.
async fn check_pdftotext(config: &AppConfig) {
    println!("\nChecking Local Text Extraction:");
    match PdfToText::new(&config.extraction.pdftotext_bin).version().await {
        Ok(version) => println!("  🟢 {version}"),
        Err(e) => println!("  🟡 {e:#} (all documents will use remote OCR)"),
    }
}

async fn check_rebuilder(config: &AppConfig) -> bool {
    println!("\nChecking PDF Rebuilder:");
    match rebuild_tool(config).check().await {
        Ok(detail) => {
            println!("  🟢 {detail}");
            true
        }
        Err(e) => {
            println!("  🔴 {e:#}");
            false
        }
    }
}

async fn check_gemini(config: &AppConfig) -> bool {
    println!("\nChecking Gemini API:");
    let result = match GeminiClient::from_settings(&config.api_key, &config.gemini) {
        Ok(client) => client.check_model().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(model) => {
            println!("  🟢 {} reachable ({model})", config.gemini.model);
            true
        }
        Err(e) => {
            println!("  🔴 {e:#}");
            false
        }
    }
}
