//! Order book error types.

use std::fmt;

/// Errors that can occur when submitting orders to the book.
///
/// Cancelling an unknown id is deliberately not an error: it returns a
/// zero cancelled quantity so that racing cancels stay benign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderBookError {
    /// Order quantity must be positive.
    InvalidQuantity {
        /// The rejected quantity.
        quantity: u64,
    },
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::InvalidQuantity { quantity } => {
                write!(f, "invalid order quantity: {quantity} (must be > 0)")
            }
        }
    }
}

impl std::error::Error for OrderBookError {}
