//! Build script for urna-core
//!
//! Stamps the binary with where it came from so `urna version` can answer
//! "which build is running against this snapshot?".

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = run("git", &["rev-parse", "--short=8", "HEAD"]);
    let git_branch = run("git", &["rev-parse", "--abbrev-ref", "HEAD"]);
    let git_dirty = match Command::new("git").args(["status", "--porcelain"]).output() {
        Ok(out) if out.status.success() => (!out.stdout.is_empty()).to_string(),
        _ => "unknown".to_string(),
    };

    let stamps = [
        ("URNA_GIT_HASH", git_hash),
        ("URNA_GIT_BRANCH", git_branch),
        ("URNA_GIT_DIRTY", git_dirty),
        (
            "URNA_BUILD_TIMESTAMP",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        ("URNA_TARGET", env_or_unknown("TARGET")),
        ("URNA_PROFILE", env_or_unknown("PROFILE")),
        ("URNA_RUSTC_VERSION", run("rustc", &["--version"])),
        ("URNA_HOST", env_or_unknown("HOST")),
    ];

    for (key, value) in &stamps {
        println!("cargo:rustc-env={}={}", key, value);
    }
}

/// Run a command and return its trimmed stdout, or "unknown"
fn run(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn env_or_unknown(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| "unknown".to_string())
}
