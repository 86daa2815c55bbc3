//! Error types for dipto-types.

use thiserror::Error;

/// A remote payload could not be turned into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload shape did not match the record schema.
    #[error("malformed record {record}: {reason}")]
    Malformed { record: String, reason: String },

    /// The embedded id disagrees with the document key.
    #[error("record key {key} does not match embedded id {id}")]
    KeyMismatch { key: String, id: String },

    /// A field is present and well-typed but out of range.
    #[error("invalid field {field} in {record}: {reason}")]
    InvalidField {
        record: String,
        field: &'static str,
        reason: String,
    },

    /// A typed record could not be encoded for the wire.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// A catalog draft is missing a required field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("draft is incomplete: {0} is required")]
    Incomplete(&'static str),

    #[error("draft price must not be negative")]
    NegativePrice,
}
