// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The error taxonomy shared by the rasterizer and the HAL collaborator
//! crate.

use thiserror::Error;

/// Errors a rasterizer or HAL operation can report.
///
/// Only [`RasterError::InvalidInput`] and [`RasterError::DriverFailure`] are
/// ever surfaced from [`crate::driver::Pipeline::rasterize`] to callers;
/// [`RasterError::StageFallback`] is logged and recorded in
/// [`crate::driver::PipelineStats`] instead of being returned, since a
/// successful CPU fallback is not itself a failure.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("resource state violation: {0}")]
    ResourceStateViolation(String),

    #[error("driver failure: {0}")]
    DriverFailure(String),

    #[error("stage {stage} fell back to CPU: {reason}")]
    StageFallback { stage: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, RasterError>;
