use thiserror::Error;

use crate::variant::LayoutVariant;

/// Errors raised while populating or reinterpreting layout data on the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{attribute} stream has {found} entries but the mesh has {expected} positions")]
    AttributeCountMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("per-view entries disagree on viewCount ({first} vs {second})")]
    ViewCountMismatch { first: i32, second: i32 },
    #[error(
        "buffer holds {buffer} ({buffer_stride} B stride) but {expected} ({expected_stride} B stride) was requested"
    )]
    VariantMismatch {
        buffer: LayoutVariant,
        buffer_stride: usize,
        expected: LayoutVariant,
        expected_stride: usize,
    },
    #[error("{len} bytes is not a whole number of {variant} records ({stride} B each)")]
    SizeMismatch {
        variant: LayoutVariant,
        len: usize,
        stride: usize,
    },
    #[error("{0} is not a vertex layout")]
    NotVertexLayout(LayoutVariant),
    #[error("unknown layout variant `{0}`")]
    UnknownVariant(String),
}
