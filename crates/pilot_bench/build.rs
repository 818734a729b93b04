use std::process::Command;

/// Exposes the commit a bench binary was built from as `GIT_SHA` / `GIT_DIRTY`.
fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs");

    let head = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());
    let dirty = Command::new("git")
        .args(["status", "--porcelain", "--untracked-files=no"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map_or(true, |output| !output.stdout.is_empty());

    println!(
        "cargo:rustc-env=GIT_SHA={}",
        head.unwrap_or_else(|| "unknown".to_string())
    );
    println!("cargo:rustc-env=GIT_DIRTY={dirty}");
}
