// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textures and their default views.
//!
//! Every texture owns exactly one default view, created alongside it; the
//! view handle is never independently destroyable and is cleaned up
//! silently when its texture is destroyed.

use std::collections::HashMap;
use std::sync::RwLock;

use raster_core::error::RasterError;

use crate::error::Result;
use crate::handle::{Handle, HandleAllocator};

#[derive(Clone, Copy, Debug)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
}

pub struct Texture;
pub struct TextureView;

struct TextureEntry {
    desc: TextureDesc,
    data: Vec<u8>,
    default_view: Handle<TextureView>,
}

#[derive(Default)]
pub struct TextureRegistry {
    entries: RwLock<HashMap<u64, TextureEntry>>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a texture and its default view in one step; the view's
    /// handle is returned alongside the texture's.
    pub fn create(
        &self,
        alloc: &HandleAllocator,
        desc: TextureDesc,
    ) -> (Handle<Texture>, Handle<TextureView>) {
        let texture = alloc.alloc();
        let view = alloc.alloc();
        let size = desc.width as usize * desc.height as usize * 4;
        let entry = TextureEntry {
            desc,
            data: vec![0; size],
            default_view: view,
        };
        self.entries.write().unwrap().insert(texture.id(), entry);
        tracing::trace!(
            handle = texture.id(),
            width = desc.width,
            height = desc.height,
            "gpu_hal: texture created"
        );
        (texture, view)
    }

    /// Idempotent, like [`crate::buffer::BufferRegistry::destroy`]. The
    /// default view is dropped silently along with the texture -- there is
    /// no separate "destroy view" call, so there is nothing to report a
    /// second `ResourceNotFound` for.
    pub fn destroy(&self, handle: Handle<Texture>) -> Result<()> {
        let removed = self.entries.write().unwrap().remove(&handle.id());
        if removed.is_some() {
            tracing::trace!(handle = handle.id(), "gpu_hal: texture destroyed");
            Ok(())
        } else {
            Err(RasterError::ResourceNotFound(format!(
                "texture handle {} not found",
                handle.id()
            )))
        }
    }

    pub fn desc(&self, handle: Handle<Texture>) -> Result<TextureDesc> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.desc)
            .ok_or_else(|| RasterError::ResourceNotFound(format!("texture handle {} not found", handle.id())))
    }

    pub fn default_view(&self, handle: Handle<Texture>) -> Result<Handle<TextureView>> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.default_view)
            .ok_or_else(|| RasterError::ResourceNotFound(format!("texture handle {} not found", handle.id())))
    }

    pub fn write(&self, handle: Handle<Texture>, bytes: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.get_mut(&handle.id()).ok_or_else(|| {
            RasterError::ResourceNotFound(format!("texture handle {} not found", handle.id()))
        })?;
        if bytes.len() != entry.data.len() {
            return Err(RasterError::InvalidInput(format!(
                "texture write of {} bytes does not match backing size {}",
                bytes.len(),
                entry.data.len()
            )));
        }
        entry.data.copy_from_slice(bytes);
        Ok(())
    }

    pub fn read(&self, handle: Handle<Texture>) -> Result<Vec<u8>> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.data.clone())
            .ok_or_else(|| RasterError::ResourceNotFound(format!("texture handle {} not found", handle.id())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_yields_a_usable_default_view() {
        let alloc = HandleAllocator::new();
        let reg = TextureRegistry::new();
        let (tex, view) = reg.create(&alloc, TextureDesc { width: 4, height: 4 });
        assert!(view.is_valid());
        assert_eq!(reg.default_view(tex).unwrap(), view);
    }

    #[test]
    fn destroy_is_idempotent_and_reports_not_found() {
        let alloc = HandleAllocator::new();
        let reg = TextureRegistry::new();
        let (tex, _) = reg.create(&alloc, TextureDesc { width: 2, height: 2 });
        reg.destroy(tex).unwrap();
        assert!(matches!(
            reg.destroy(tex).unwrap_err(),
            RasterError::ResourceNotFound(_)
        ));
    }

    #[test]
    fn write_size_mismatch_is_invalid_input() {
        let alloc = HandleAllocator::new();
        let reg = TextureRegistry::new();
        let (tex, _) = reg.create(&alloc, TextureDesc { width: 2, height: 2 });
        let err = reg.write(tex, &[0u8; 3]).unwrap_err();
        assert!(matches!(err, RasterError::InvalidInput(_)));
    }
}
