// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The HAL reuses the rasterizer's error taxonomy rather than minting its
//! own -- a `ResourceNotFound` means the same thing whether it came from a
//! dangling buffer handle or a dangling pipeline handle.

pub use raster_core::error::{RasterError, Result};
