use thiserror::Error;

/// Errors reported to callers of the sleep operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    #[error("Sleep cancelled before deadline")]
    Cancelled,
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_message() {
        assert_eq!(
            ClockError::Cancelled.to_string(),
            "Sleep cancelled before deadline"
        );
    }
}
