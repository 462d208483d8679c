// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compute pass recording.
//!
//! A [`ComputePass`] is a small command buffer: `set_pipeline`, `set_bind_group`
//! and `dispatch` just append to it. Nothing executes until the recorded
//! commands are handed to [`crate::adapter::Device::submit`].

use raster_core::error::RasterError;

use crate::buffer::Buffer;
use crate::error::Result;
use crate::handle::Handle;
use crate::pipeline::ComputePipeline;

#[derive(Debug)]
pub enum Command {
    SetPipeline(Handle<ComputePipeline>),
    SetBindGroup { index: u32, buffers: Vec<Handle<Buffer>> },
    Dispatch { x: u32, y: u32, z: u32 },
}

/// Recorded commands for one compute pass. Dropping a pass without
/// submitting it simply discards the recording -- there is no device-side
/// state to leak, since nothing was dispatched yet.
#[derive(Default)]
pub struct ComputePass {
    commands: Vec<Command>,
    pipeline_set: bool,
}

impl ComputePass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pipeline(&mut self, pipeline: Handle<ComputePipeline>) {
        self.commands.push(Command::SetPipeline(pipeline));
        self.pipeline_set = true;
    }

    pub fn set_bind_group(&mut self, index: u32, buffers: Vec<Handle<Buffer>>) {
        self.commands.push(Command::SetBindGroup { index, buffers });
    }

    /// Records a dispatch. Requires a pipeline to already be set, matching
    /// the order real compute-pass encoders enforce.
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        if !self.pipeline_set {
            return Err(RasterError::ResourceStateViolation(
                "dispatch recorded before set_pipeline".into(),
            ));
        }
        self.commands.push(Command::Dispatch { x, y, z });
        Ok(())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
