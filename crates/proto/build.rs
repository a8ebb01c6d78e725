//! Build script for boxoffice-proto.
//!
//! Compiles the protobuf definitions with tonic-prost-build when a protoc
//! binary is available. Environments without protoc (and builds of the
//! published crate, which does not ship the proto directory) fall back to
//! the pre-generated code in src/generated/.

use std::path::Path;
use std::process::Command;

fn protoc_available() -> bool {
    if std::env::var_os("PROTOC").is_some() {
        return true;
    }
    Command::new("protoc")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Declare custom cfg for conditional compilation
    println!("cargo::rustc-check-cfg=cfg(use_pregenerated_proto)");

    let proto_path = Path::new("../../proto/boxoffice/v1/boxoffice.proto");

    if proto_path.exists() && protoc_available() {
        println!("cargo::rerun-if-changed=../../proto/boxoffice/v1/boxoffice.proto");

        tonic_prost_build::configure()
            .build_server(true)
            .build_client(true)
            .emit_rerun_if_changed(true)
            .compile_protos(&["../../proto/boxoffice/v1/boxoffice.proto"], &["../../proto"])?;
    } else {
        // Signal that we're using pre-generated code
        println!("cargo::rustc-cfg=use_pregenerated_proto");
    }

    Ok(())
}
