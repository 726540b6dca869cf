use solar_verify_core::MaskError;

/// Errors returned by the panel detector.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("invalid detector parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Mask(#[from] MaskError),
}
