/// Compression applied to whole frames before chunking, per direction
#[derive(Clone, Debug, Default)]
pub struct CompressionConfig {
    pub server_to_client: Option<CompressionMode>,
    pub client_to_server: Option<CompressionMode>,
}

impl CompressionConfig {
    pub fn new(
        server_to_client: Option<CompressionMode>,
        client_to_server: Option<CompressionMode>,
    ) -> Self {
        Self {
            server_to_client,
            client_to_server,
        }
    }

    /// The same mode both ways
    pub fn both(mode: CompressionMode) -> Self {
        Self::new(Some(mode.clone()), Some(mode))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompressionMode {
    /// Compression level, from -7 (fastest) to 22 (smallest)
    Default(i32),
    /// Compression level and a dictionary trained on typical frames
    Dictionary(i32, Vec<u8>),
}
