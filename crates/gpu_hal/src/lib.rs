// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![forbid(unsafe_code)]

//! An opaque-handle GPU hardware abstraction layer backing the
//! rasterizer's GPU-labelled stages.
//!
//! There is no real GPU backend here -- `adapter::Device` validates and
//! "runs" recorded compute passes synchronously on the CPU. The point of
//! this crate is the resource-lifecycle contract a real backend would also
//! have to honor: opaque handles ([`handle::Handle`]) that never alias a
//! live resource with a dead one, idempotent destroy, and a buffer map
//! lifecycle whose pending callback fires exactly once no matter how the
//! map resolves.

pub mod adapter;
pub mod buffer;
pub mod error;
pub mod handle;
pub mod pass;
pub mod pipeline;
pub mod shader;
pub mod texture;

pub use adapter::{Device, DeviceConfig, Fence};
pub use buffer::{Buffer, BufferState, BufferUsage, MapMode, MapOutcome};
pub use error::{RasterError, Result};
pub use handle::Handle;
pub use pass::ComputePass;
pub use pipeline::ComputePipeline;
pub use shader::Shader;
pub use texture::{Texture, TextureDesc, TextureView};
