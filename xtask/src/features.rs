use std::process::Command;

use anyhow::{Context, Result};

/// `steadfast-common` feature tiers, each checked with default features off.
const FEATURE_TIERS: &[&[&str]] = &[
    &["foundation"],
    &["observability"],
    &["runtime"],
    &["test-utils"],
    &["foundation", "test-utils"],
];

/// Check that every feature tier of `steadfast-common` compiles and its tests
/// pass on their own.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} steadfast-common feature tiers...", FEATURE_TIERS.len());

    for (index, features) in FEATURE_TIERS.iter().enumerate() {
        let joined = features.join(",");

        println!(
            "\n[{}/{}] cargo test -p steadfast-common --no-default-features --features {joined}",
            index + 1,
            FEATURE_TIERS.len(),
        );

        let status = Command::new("cargo")
            .args(["test", "-p", "steadfast-common", "--no-default-features", "--features"])
            .arg(&joined)
            .status()
            .with_context(|| format!("Failed to run cargo test for '{joined}'"))?;

        if !status.success() {
            anyhow::bail!("Feature tier '{joined}' failed");
        }

        println!("✅ Features '{joined}' passed");
    }

    println!("\n✅ All {} feature tiers pass!", FEATURE_TIERS.len());

    Ok(())
}
