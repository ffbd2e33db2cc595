//! Shared proto-compilation helper for service `build.rs` scripts.
//!
//! Not part of the library's public runtime surface — consumed only from
//! `build.rs`, which depends on this crate as a path build-dependency the
//! same way the corpus's framework crate is consumed from its own
//! `build.rs` helpers.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("proto directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("proto compilation failed: {0}")]
    Compile(#[from] std::io::Error),
}

/// Compiles every `.proto` file in `proto_dir`, emitting a file descriptor
/// set alongside the generated code so `tonic-reflection` can serve it.
pub fn compile_protos_from_dir(proto_dir: &Path) -> Result<(), BuildError> {
    if !proto_dir.is_dir() {
        return Err(BuildError::MissingDir(proto_dir.to_path_buf()));
    }

    let files: Vec<PathBuf> = std::fs::read_dir(proto_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("proto"))
        .collect();

    let descriptor_path = PathBuf::from(std::env::var("OUT_DIR").unwrap()).join("descriptor.bin");

    tonic_prost_build::configure()
        .file_descriptor_set_path(&descriptor_path)
        .compile_protos(&files, &[proto_dir.to_path_buf()])
        .map_err(|e| BuildError::Compile(std::io::Error::other(e.to_string())))?;

    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    Ok(())
}

/// Looks up `MARKETPLACE_PROTO_DIR`, falling back to the workspace-root
/// `proto/` directory two levels up from the service crate.
pub fn compile_service_protos() -> Result<(), BuildError> {
    let dir = std::env::var("MARKETPLACE_PROTO_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("../../proto"));
    compile_protos_from_dir(&dir)
}
