use chrono::Utc;
use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::Command;

/// `[package.metadata] module_api_version`, or "unknown"
fn module_api_version(manifest: &str) -> String {
    manifest
        .parse::<toml::Table>()
        .ok()
        .as_ref()
        .and_then(|cargo_toml| cargo_toml.get("package"))
        .and_then(|package| package.get("metadata"))
        .and_then(|metadata| metadata.get("module_api_version"))
        .and_then(|version| version.as_integer())
        .map(|version| version.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")?;
    let manifest = fs::read_to_string(Path::new(&manifest_dir).join("Cargo.toml"))?;

    let generated = format!(
        "pub const MODULE_API_VERSION: &str = \"{}\";\n\
         pub const BUILD_TIME: &str = \"{}\";\n\
         pub const GIT_HASH: &str = \"{}\";\n",
        module_api_version(&manifest),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        git_hash()
    );
    fs::write(Path::new(&out_dir).join("version.rs"), generated)?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
    Ok(())
}
