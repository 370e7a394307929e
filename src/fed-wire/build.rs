fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var(
        "PROTOC",
        protoc_bin_vendored::protoc_bin_path().expect("vendored protoc binary"),
    );
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile(&["proto/federator.proto"], &["proto"])?;
    Ok(())
}
