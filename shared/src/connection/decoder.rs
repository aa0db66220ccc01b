cfg_if! {
    if #[cfg(feature = "zstd_support")]
    {
        use zstd::bulk::Decompressor;

        use super::compression_config::CompressionMode;
        use super::error::DecoderError;

        pub struct Decoder {
            result: Vec<u8>,
            max_frame_bytes: usize,
            decompressor: Decompressor<'static>,
        }

        impl Decoder {
            /// Try to create a new Decoder with the specified compression mode
            pub fn try_new(
                compression_mode: CompressionMode,
                max_frame_bytes: usize,
            ) -> Result<Self, DecoderError> {
                let decompressor = match compression_mode {
                    CompressionMode::Default(_) => {
                        Decompressor::new().map_err(|_| DecoderError::DecompressorCreationFailed)?
                    }
                    CompressionMode::Dictionary(_, dictionary) => {
                        Decompressor::with_dictionary(&dictionary)
                            .map_err(|_| DecoderError::DecompressorWithDictionaryFailed)?
                    }
                };

                Ok(Self {
                    result: Vec::new(),
                    max_frame_bytes,
                    decompressor,
                })
            }

            /// Try to decompress a frame, returning error on decompression failure
            ///
            /// SECURITY: This method processes untrusted network data. Output is
            /// capped at the largest frame size, so a crafted payload cannot
            /// inflate without bound.
            pub fn try_decode(&mut self, payload: &[u8]) -> Result<&[u8], DecoderError> {
                let failed = DecoderError::DecompressionFailed {
                    payload_size: payload.len(),
                };
                self.result.clear();
                self.result.reserve_exact(self.max_frame_bytes);
                self.decompressor
                    .decompress_to_buffer(payload, &mut self.result)
                    .map_err(|_| failed.clone())?;
                if self.result.len() > self.max_frame_bytes {
                    return Err(failed);
                }
                Ok(&self.result)
            }
        }
    }
    else
    {
        use super::compression_config::CompressionMode;
        use super::error::DecoderError;

        /// Pass-through used when built without `zstd_support`
        pub struct Decoder {
            result: Vec<u8>,
        }

        impl Decoder {
            pub fn try_new(_: CompressionMode, _max_frame_bytes: usize) -> Result<Self, DecoderError> {
                Ok(Self { result: Vec::new() })
            }

            pub fn try_decode(&mut self, payload: &[u8]) -> Result<&[u8], DecoderError> {
                self.result.clear();
                self.result.extend_from_slice(payload);
                Ok(&self.result)
            }
        }
    }
}
