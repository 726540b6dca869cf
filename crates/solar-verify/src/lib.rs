//! High-level facade crate for the `solar-verify-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core data model and the detection stages
//! - [`VerificationPipeline`]: preprocess, detect, compare, score and render
//!   in one call, with every outcome captured in a [`VerificationRecord`]
//! - JSON configuration ([`VerifierConfig`]) and report ([`VerificationReport`]) I/O
//! - synthetic demo scenes in [`demo`]
//!
//! ## Quickstart
//!
//! ```no_run
//! use solar_verify::{VerificationPipeline, VerifierConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = VerificationPipeline::new(VerifierConfig::default());
//! let record = pipeline.verify_paths("roof.jpg", None);
//! println!("{}: {}", record.verdict(), record.message());
//! pipeline.persist(&record)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `solar_verify::core`: images, masks, HSV pixels, panel regions, logging.
//! - `solar_verify::detect`: preprocessing, panel detection, coverage,
//!   similarity and confidence scoring.
//! - [`ReportRenderer`]: annotated report images.

pub use solar_verify_core as core;
pub use solar_verify_detect as detect;

pub use solar_verify_core::{BinaryMask, PanelRegion, RasterImage};
pub use solar_verify_detect::{DetectionResult, Verdict};

pub mod demo;
mod font;
mod io;
mod report;
mod verify;

pub use io::{IoError, OutputConfig, VerificationReport, VerifierConfig, LATEST_RESULTS_FILE};
pub use report::{RenderError, ReportRenderer, ReportSummary, SIDE_PANEL_WIDTH};
pub use verify::{
    load_image, InputRefs, ProcessingError, ScoredOutcome, Status, VerificationOutcome,
    VerificationPipeline, VerificationRecord, VerifyError, NO_PANELS_MESSAGE,
};
