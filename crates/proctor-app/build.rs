//! Embeds the workspace `VERSION` file as `PROCTOR_VERSION`.

use std::path::Path;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let version_path = Path::new(&manifest_dir)
        .ancestors()
        .nth(2)
        .expect("proctor-app lives at <root>/crates/proctor-app")
        .join("VERSION");
    println!("cargo:rerun-if-changed={}", version_path.display());

    let version = std::fs::read_to_string(&version_path)
        .unwrap_or_else(|error| panic!("cannot read {}: {error}", version_path.display()));
    let version = version.trim();
    if version.is_empty() || version.contains(char::is_whitespace) {
        panic!("VERSION must hold a single non-empty token, got {version:?}");
    }

    println!("cargo:rustc-env=PROCTOR_VERSION={version}");
}
