//! Stamps `quire --version` with the commit the binary was built from.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let package = env!("CARGO_PKG_VERSION");
    let version = match commit() {
        Some(commit) => format!("{} ({})", package, commit),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=QUIRE_VERSION={}", version);
}

/// Short hash of HEAD, marked `-dirty` when the tree has local changes.
/// `None` outside a git checkout (e.g. a crates.io build).
fn commit() -> Option<String> {
    let hash = git(&["rev-parse", "--short", "HEAD"]).filter(|h| !h.is_empty())?;
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());

    Some(if dirty { format!("{}-dirty", hash) } else { hash })
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
