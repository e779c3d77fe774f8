fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/netopt.proto");

    // Only the gRPC surface needs generated code
    if std::env::var_os("CARGO_FEATURE_SERVER").is_some() {
        tonic_build::compile_protos("proto/netopt.proto")?;
    }
    Ok(())
}
