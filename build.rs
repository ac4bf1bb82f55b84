use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if let Some(info) = commit_info() {
        println!(
            "cargo:rustc-env=CARGO_VERSION_INFO={} ({info})",
            env!("CARGO_PKG_VERSION")
        );
    }
}

/// The abbreviated hash and date of the checked out commit.
fn commit_info() -> Option<String> {
    if !Path::new(".git").exists() {
        return None;
    }
    let output = Command::new("git")
        .arg("log")
        .arg("-1")
        .arg("--date=short")
        .arg("--format=%h %cd")
        .arg("--abbrev=9")
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let stdout = String::from_utf8(output.stdout).ok()?;
    let mut parts = stdout.split_whitespace();
    let hash = parts.next()?;
    let date = parts.next()?;
    Some(format!("{hash} {date}"))
}
