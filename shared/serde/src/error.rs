use thiserror::Error;

/// Errors that can occur while reading typed values out of a byte buffer
///
/// SECURITY: every variant may be produced by untrusted network data, so none of
/// them are fatal. Callers abandon the value being read and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The buffer ran out before the value was fully read
    #[error("Buffer truncated: needed {needed} bytes but only {remaining} remain")]
    Truncated { needed: usize, remaining: usize },

    /// The bytes were present but do not form a valid value of the type
    #[error("Invalid value while reading {type_name}")]
    InvalidValue { type_name: &'static str },

    /// A length prefix is larger than anything this codec will allocate
    #[error("Length prefix {length} exceeds the maximum of {max}")]
    LengthOverflow { length: u64, max: u64 },
}

impl SerdeErr {
    pub fn is_truncated(&self) -> bool {
        matches!(self, SerdeErr::Truncated { .. })
    }
}
