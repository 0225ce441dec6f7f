fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Both halves of the stub: the server crate implements the generated trait
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile(&["../../proto/movie_service.proto"], &["../../proto"])?;
    Ok(())
}
