use thiserror::Error;

/// Failure to grow a vector past its structural limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// The result would hold more elements than [`CAPACITY`](crate::CAPACITY).
    #[error("vector length {requested} exceeds the maximum of {max} elements")]
    Length {
        /// Length the operation would have produced.
        requested: usize,
        /// Largest supported length.
        max: usize,
    },
    /// The result would need more tree levels than
    /// [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("tree depth {requested} exceeds the maximum of {max} levels")]
    Depth {
        /// Depth the operation would have produced.
        requested: usize,
        /// Largest supported depth.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CapacityError::Depth { requested: 7, max: 6 };
        assert_eq!(err.to_string(), "tree depth 7 exceeds the maximum of 6 levels");
        let err = CapacityError::Length { requested: 10, max: 9 };
        assert!(err.to_string().starts_with("vector length 10"));
    }
}
