//! Event probe
//!
//! Installs the real keyboard and mouse hooks in-process, records activity
//! for a few seconds and prints what was captured as JSON.
//!
//! Run with: cargo run --example event_probe -- 5
//!
//! On macOS the terminal needs the Input Monitoring permission.

use input_mcp::{call_tool, init_logging, Config, Context};
use serde_json::json;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(config.log_level);

    let seconds: u64 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()?
        .unwrap_or(5);

    let context = Context::new(&config);

    // The first read installs the hooks
    for tool in ["monitor_keyboard_events", "monitor_mouse_events"] {
        if let Err(e) = call_tool(&context, tool, None) {
            eprintln!("{} unavailable: {}", tool, e);
            return Ok(());
        }
    }

    eprintln!("Recording keyboard and mouse for {} seconds...", seconds);
    std::thread::sleep(Duration::from_secs(seconds));

    for tool in ["monitor_keyboard_events", "monitor_mouse_events"] {
        let result = call_tool(&context, tool, Some(json!({"cursor": 0, "reason": "event probe"})))?;
        if let Some(batch) = result.json_payload() {
            println!("{}", serde_json::to_string_pretty(batch)?);
        }
    }

    context.shutdown();
    Ok(())
}
