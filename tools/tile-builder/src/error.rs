//! Error type shared by the packaging operations

/// Failure while injecting batch ids or assembling a container
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// A mesh has no primitive with a usable POSITION accessor
    #[error("mesh {mesh} has no primitive with a POSITION accessor")]
    MissingAccessor { mesh: usize },

    /// JSON serialization failed
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value does not fit in its fixed-width field
    #[error("{what} is {value}, which exceeds the limit of {limit}")]
    SizeLimitExceeded {
        what: &'static str,
        value: u64,
        limit: u64,
    },

    /// The document already carries `_BATCHID` attributes
    #[error("mesh {mesh} already has a _BATCHID attribute")]
    DuplicateBatchId { mesh: usize },
}

pub type Result<T> = std::result::Result<T, TileError>;

/// Convert a length to a u32 header field
pub(crate) fn to_u32(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| TileError::SizeLimitExceeded {
        what,
        value: value as u64,
        limit: u32::MAX as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u32() {
        assert_eq!(to_u32("length", 36).unwrap(), 36);
        assert_eq!(to_u32("length", u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_to_u32_overflow() {
        let err = to_u32("x", u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(
            err,
            TileError::SizeLimitExceeded {
                what: "x",
                value: 4_294_967_296,
                limit: 4_294_967_295,
            }
        ));
        assert_eq!(
            err.to_string(),
            "x is 4294967296, which exceeds the limit of 4294967295"
        );
    }
}
