//! Validation of candidate headers before they reach the store.

mod headers;

pub use headers::{HeaderBatch, HeaderChainValidator};

use crate::error::ValidationResult;

pub trait Validator<T> {
    fn validate(&self, data: T) -> ValidationResult<()>;
}
