use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use swarm_core::protocol::classify_final;

pub fn run(file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read transcript {}", file.display()))?;

    let fragments = classify_final(&text);
    println!("{}", serde_json::to_string_pretty(&fragments)?);
    Ok(())
}
