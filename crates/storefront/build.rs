//! Build script for the storefront crate.
//!
//! Fingerprints the static assets so templates can reference them with a
//! cache-busting `?v=` query.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// `(relative path, env var)` for each fingerprinted asset.
const ASSETS: &[(&str, &str)] = &[
    ("static/css/main.css", "CSS_HASH"),
    ("static/js/payment.js", "PAYMENT_JS_HASH"),
];

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping asset hashes");
        for (_, var) in ASSETS {
            println!("cargo:rustc-env={var}=dev");
        }
        return;
    };

    for (relative, var) in ASSETS {
        let path = Path::new(&manifest_dir).join(relative);
        println!("cargo:rerun-if-changed={}", path.display());

        let short_hash = match fs::read(&path) {
            Ok(content) => {
                let digest = format!("{:x}", Sha256::digest(&content));
                digest.chars().take(8).collect::<String>()
            }
            Err(e) => {
                println!("cargo:warning=Could not read {relative}: {e}");
                "dev".to_string()
            }
        };

        println!("cargo:rustc-env={var}={short_hash}");
    }
}
