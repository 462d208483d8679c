// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compute pipelines: a shader handle plus the workgroup size it expects.

use std::collections::HashMap;
use std::sync::RwLock;

use raster_core::error::RasterError;

use crate::error::Result;
use crate::handle::{Handle, HandleAllocator};
use crate::shader::Shader;

pub struct ComputePipeline;

struct PipelineEntry {
    shader: Handle<Shader>,
    workgroup_size: (u32, u32, u32),
}

#[derive(Default)]
pub struct PipelineRegistry {
    entries: RwLock<HashMap<u64, PipelineEntry>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        alloc: &HandleAllocator,
        shader: Handle<Shader>,
        workgroup_size: (u32, u32, u32),
    ) -> Handle<ComputePipeline> {
        let handle = alloc.alloc();
        self.entries.write().unwrap().insert(
            handle.id(),
            PipelineEntry {
                shader,
                workgroup_size,
            },
        );
        handle
    }

    pub fn destroy(&self, handle: Handle<ComputePipeline>) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .remove(&handle.id())
            .map(|_| ())
            .ok_or_else(|| {
                RasterError::ResourceNotFound(format!("pipeline handle {} not found", handle.id()))
            })
    }

    pub fn shader(&self, handle: Handle<ComputePipeline>) -> Result<Handle<Shader>> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.shader)
            .ok_or_else(|| RasterError::ResourceNotFound(format!("pipeline handle {} not found", handle.id())))
    }

    pub fn workgroup_size(&self, handle: Handle<ComputePipeline>) -> Result<(u32, u32, u32)> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.workgroup_size)
            .ok_or_else(|| RasterError::ResourceNotFound(format!("pipeline handle {} not found", handle.id())))
    }
}
