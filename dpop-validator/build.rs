fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/dpop.proto");

    // No system `protoc` is assumed to be present; use the vendored binary
    // instead of requiring one to be preinstalled.
    unsafe {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&["proto/dpop.proto"], &["proto"])?;

    Ok(())
}
