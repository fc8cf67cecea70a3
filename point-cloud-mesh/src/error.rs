use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconstructError>;

/// Status code returned across the foreign boundary.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    EmptyInput = 1,
    AllocFail = 2,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("Point cloud needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("Bounding box does not span a usable grid")]
    DegenerateBounds,

    #[error("Triangulation produced no usable triangles")]
    NoTriangles,

    #[error("Output mesh pointer is null")]
    NullOutput,

    #[error("Failed to allocate {0}")]
    Alloc(&'static str),

    #[error("Reconstruction panicked")]
    Panicked,
}

impl ReconstructError {
    /// Collapse the error into the two failure kinds the host understands.
    pub fn status(&self) -> Status {
        match self {
            ReconstructError::TooFewPoints(_)
            | ReconstructError::DegenerateBounds
            | ReconstructError::NoTriangles => Status::EmptyInput,
            ReconstructError::NullOutput
            | ReconstructError::Alloc(_)
            | ReconstructError::Panicked => Status::AllocFail,
        }
    }
}

/// Reserve exactly `additional` slots or report which buffer could not be allocated.
pub(crate) fn reserve<T>(buf: &mut Vec<T>, additional: usize, what: &'static str) -> Result<()> {
    buf.try_reserve_exact(additional)
        .map_err(|_| ReconstructError::Alloc(what))
}
