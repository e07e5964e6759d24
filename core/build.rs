//! Build script to capture the compiler version for the default user agent.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=RUSTC");

    let version = rustc_version().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=SPAPI_RUSTC_VERSION={}", version);
}

/// Second word of `rustc --version`, e.g. `1.83.0` from
/// `rustc 1.83.0 (90b35a623 2024-11-26)`.
fn rustc_version() -> Option<String> {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let output = Command::new(rustc).arg("--version").output().ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    stdout.split_whitespace().nth(1).map(str::to_string)
}
