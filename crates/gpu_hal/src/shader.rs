// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shader modules. The HAL treats shader source as an opaque blob -- it
//! never parses or validates it, since nothing downstream of `pass.rs`
//! actually dispatches real device work.

use std::collections::HashMap;
use std::sync::RwLock;

use raster_core::error::RasterError;

use crate::error::Result;
use crate::handle::{Handle, HandleAllocator};

pub struct Shader;

struct ShaderEntry {
    #[allow(dead_code)]
    source: String,
    entry_point: String,
}

#[derive(Default)]
pub struct ShaderRegistry {
    entries: RwLock<HashMap<u64, ShaderEntry>>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        alloc: &HandleAllocator,
        source: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Handle<Shader> {
        let handle = alloc.alloc();
        let entry = ShaderEntry {
            source: source.into(),
            entry_point: entry_point.into(),
        };
        self.entries.write().unwrap().insert(handle.id(), entry);
        handle
    }

    pub fn destroy(&self, handle: Handle<Shader>) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .remove(&handle.id())
            .map(|_| ())
            .ok_or_else(|| RasterError::ResourceNotFound(format!("shader handle {} not found", handle.id())))
    }

    pub fn entry_point(&self, handle: Handle<Shader>) -> Result<String> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.entry_point.clone())
            .ok_or_else(|| RasterError::ResourceNotFound(format!("shader handle {} not found", handle.id())))
    }
}
