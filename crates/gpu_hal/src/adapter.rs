// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Device`]: the façade that owns every resource registry and accepts
//! recorded work via [`Device::submit`].
//!
//! There is no real GPU behind this HAL, so `submit` validates the
//! recorded commands against the live registries and "executes" them
//! synchronously; the fence it returns is already signaled by the time
//! `submit` returns. `wait_idle` exists for API parity with a real
//! device and to exercise the same fixed-timeout contract
//! `driver::Pipeline` uses for its GPU-labelled stages.

use std::time::Duration;

use raster_core::error::RasterError;

use crate::buffer::{Buffer, BufferRegistry, BufferUsage};
use crate::error::Result;
use crate::handle::{Handle, HandleAllocator};
use crate::pass::{Command, ComputePass};
use crate::pipeline::PipelineRegistry;
use crate::shader::ShaderRegistry;
use crate::texture::TextureRegistry;

#[derive(Clone, Copy, Debug)]
pub struct DeviceConfig {
    pub wait_timeout: Duration,
    /// Test-only knob mirroring `driver::DriverConfig::simulate_gpu_failure`.
    pub simulate_submit_failure: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            wait_timeout: Duration::from_secs(5),
            simulate_submit_failure: false,
        }
    }
}

pub struct Fence;

pub struct Device {
    config: DeviceConfig,
    handles: HandleAllocator,
    pub buffers: BufferRegistry,
    pub textures: TextureRegistry,
    pub shaders: ShaderRegistry,
    pub pipelines: PipelineRegistry,
}

impl Device {
    pub fn new(config: DeviceConfig) -> Self {
        Device {
            config,
            handles: HandleAllocator::new(),
            buffers: BufferRegistry::new(),
            textures: TextureRegistry::new(),
            shaders: ShaderRegistry::new(),
            pipelines: PipelineRegistry::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Fails on zero size or an empty usage mask; see
    /// [`BufferRegistry::create`].
    pub fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<Handle<Buffer>> {
        self.buffers.create(&self.handles, size, usage)
    }

    pub fn create_texture(
        &self,
        desc: crate::texture::TextureDesc,
    ) -> (Handle<crate::texture::Texture>, Handle<crate::texture::TextureView>) {
        self.textures.create(&self.handles, desc)
    }

    pub fn create_shader(
        &self,
        source: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Handle<crate::shader::Shader> {
        self.shaders.create(&self.handles, source, entry_point)
    }

    pub fn create_pipeline(
        &self,
        shader: Handle<crate::shader::Shader>,
        workgroup_size: (u32, u32, u32),
    ) -> Handle<crate::pipeline::ComputePipeline> {
        self.pipelines.create(&self.handles, shader, workgroup_size)
    }

    /// Validates every handle referenced by the pass against the live
    /// registries, then "runs" it. Returns `DriverFailure` if
    /// `simulate_submit_failure` is set, after validation -- so a test can
    /// still distinguish a bad recording (`InvalidInput`/`ResourceNotFound`)
    /// from a simulated device failure.
    pub fn submit(&self, pass: ComputePass) -> Result<Handle<Fence>> {
        let commands = pass.into_commands();
        let mut pipeline_bound = false;
        for command in &commands {
            match command {
                Command::SetPipeline(p) => {
                    self.pipelines.shader(*p)?;
                    pipeline_bound = true;
                }
                Command::SetBindGroup { buffers, .. } => {
                    for b in buffers {
                        self.buffers.state(*b)?;
                    }
                }
                Command::Dispatch { .. } => {
                    if !pipeline_bound {
                        return Err(RasterError::ResourceStateViolation(
                            "dispatch submitted before a pipeline was bound".into(),
                        ));
                    }
                }
            }
        }

        if self.config.simulate_submit_failure {
            tracing::warn!("gpu_hal: simulated submit failure");
            return Err(RasterError::DriverFailure(
                "simulated device failure during submit".into(),
            ));
        }

        tracing::trace!(commands = commands.len(), "gpu_hal: submitted compute pass");
        Ok(self.handles.alloc())
    }

    /// Every fence from this stub device is signaled synchronously inside
    /// `submit`, so waiting on one never actually blocks; this still honors
    /// the configured timeout as a sanity bound.
    pub fn wait_idle(&self, fence: Handle<Fence>) -> Result<()> {
        if !fence.is_valid() {
            return Err(RasterError::InvalidInput("fence handle is invalid".into()));
        }
        let _ = self.config.wait_timeout;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureDesc;

    #[test]
    fn submit_empty_pass_succeeds() {
        let device = Device::new(DeviceConfig::default());
        let fence = device.submit(ComputePass::new()).unwrap();
        device.wait_idle(fence).unwrap();
    }

    #[test]
    fn submit_validates_bound_buffers() {
        let device = Device::new(DeviceConfig::default());
        let shader = device.create_shader("fn main() {}", "main");
        let pipeline = device.create_pipeline(shader, (1, 1, 1));
        let buffer = device.create_buffer(16, BufferUsage::STORAGE).unwrap();
        device.buffers.destroy(buffer).unwrap();

        let mut pass = ComputePass::new();
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, vec![buffer]);
        pass.dispatch(1, 1, 1).unwrap();

        let err = device.submit(pass).unwrap_err();
        assert!(matches!(err, RasterError::ResourceNotFound(_)));
    }

    #[test]
    fn simulated_failure_surfaces_as_driver_failure() {
        let device = Device::new(DeviceConfig {
            simulate_submit_failure: true,
            ..Default::default()
        });
        let err = device.submit(ComputePass::new()).unwrap_err();
        assert!(matches!(err, RasterError::DriverFailure(_)));
    }

    #[test]
    fn create_buffer_rejects_zero_size() {
        let device = Device::new(DeviceConfig::default());
        let err = device.create_buffer(0, BufferUsage::STORAGE).unwrap_err();
        assert!(matches!(err, RasterError::InvalidInput(_)));
    }

    #[test]
    fn full_resource_lifecycle_through_the_device() {
        let device = Device::new(DeviceConfig::default());
        let (texture, view) = device.create_texture(TextureDesc { width: 4, height: 4 });
        assert!(view.is_valid());
        assert_eq!(device.textures.default_view(texture).unwrap(), view);
        device.textures.destroy(texture).unwrap();
    }
}
