// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffers and their `Unmapped -> Pending -> Mapped -> Unmapped` lifecycle.

use std::collections::HashMap;
use std::sync::RwLock;

use bitflags::bitflags;
use raster_core::error::RasterError;

use crate::error::Result;
use crate::handle::{Handle, HandleAllocator};

bitflags! {
    /// What a buffer may be used for. `create` rejects an empty mask, and
    /// [`BufferRegistry::map_async`] rejects a [`MapMode`] the buffer's own
    /// usage doesn't grant.
    pub struct BufferUsage: u32 {
        const MAP_READ = 1 << 0;
        const MAP_WRITE = 1 << 1;
        const COPY_SRC = 1 << 2;
        const COPY_DST = 1 << 3;
        const STORAGE = 1 << 4;
    }
}

/// Which access a [`BufferRegistry::map_async`] call is requesting, checked
/// against the buffer's [`BufferUsage`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MapMode {
    Read,
    Write,
}

impl MapMode {
    fn required_usage(self) -> BufferUsage {
        match self {
            MapMode::Read => BufferUsage::MAP_READ,
            MapMode::Write => BufferUsage::MAP_WRITE,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferState {
    Unmapped,
    Pending,
    Mapped,
}

/// How a pending map request resolved. Exactly one of these is ever
/// delivered per `map_async` call, whether the resolution is success or the
/// buffer was pulled out from under it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MapOutcome {
    Success,
    UnmappedBeforeCallback,
    DestroyedBeforeCallback,
}

pub struct Buffer;

struct BufferEntry {
    data: Vec<u8>,
    usage: BufferUsage,
    state: BufferState,
    pending: Option<Box<dyn FnOnce(MapOutcome) + Send>>,
}

#[derive(Default)]
pub struct BufferRegistry {
    entries: RwLock<HashMap<u64, BufferEntry>>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on a nonsensical request: zero size, or a usage mask that
    /// grants nothing.
    pub fn create(
        &self,
        alloc: &HandleAllocator,
        size: u64,
        usage: BufferUsage,
    ) -> Result<Handle<Buffer>> {
        if size == 0 {
            return Err(RasterError::InvalidInput(
                "buffer size must be nonzero".into(),
            ));
        }
        if usage.is_empty() {
            return Err(RasterError::InvalidInput(
                "buffer usage mask must be nonempty".into(),
            ));
        }
        let handle = alloc.alloc();
        let entry = BufferEntry {
            data: vec![0; size as usize],
            usage,
            state: BufferState::Unmapped,
            pending: None,
        };
        self.entries.write().unwrap().insert(handle.id(), entry);
        tracing::trace!(handle = handle.id(), size, ?usage, "gpu_hal: buffer created");
        Ok(handle)
    }

    /// Idempotent: destroying an already-destroyed (or never-created)
    /// handle returns `ResourceNotFound` rather than panicking. Any pending
    /// map callback fires with `DestroyedBeforeCallback` before the entry is
    /// dropped.
    pub fn destroy(&self, handle: Handle<Buffer>) -> Result<()> {
        let entry = self.entries.write().unwrap().remove(&handle.id());
        match entry {
            Some(mut entry) => {
                if let Some(cb) = entry.pending.take() {
                    cb(MapOutcome::DestroyedBeforeCallback);
                }
                tracing::trace!(handle = handle.id(), "gpu_hal: buffer destroyed");
                Ok(())
            }
            None => Err(RasterError::ResourceNotFound(format!(
                "buffer handle {} not found",
                handle.id()
            ))),
        }
    }

    pub fn write(&self, handle: Handle<Buffer>, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.get_mut(&handle.id()).ok_or_else(|| {
            RasterError::ResourceNotFound(format!("buffer handle {} not found", handle.id()))
        })?;
        let start = offset as usize;
        let end = start + bytes.len();
        if end > entry.data.len() {
            return Err(RasterError::InvalidInput(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                bytes.len(),
                offset,
                entry.data.len()
            )));
        }
        entry.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn state(&self, handle: Handle<Buffer>) -> Result<BufferState> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&handle.id())
            .map(|e| e.state)
            .ok_or_else(|| RasterError::ResourceNotFound(format!("buffer handle {} not found", handle.id())))
    }

    /// Begin an async map. Must be called from `Unmapped`, and `mode` must
    /// be granted by the buffer's usage mask (e.g. `MapMode::Read` requires
    /// `MAP_READ`); either violation is a `ResourceStateViolation` and
    /// `callback` is never invoked. Resolution happens via
    /// [`Self::poll_map_async`].
    pub fn map_async(
        &self,
        handle: Handle<Buffer>,
        mode: MapMode,
        callback: impl FnOnce(MapOutcome) + Send + 'static,
    ) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.get_mut(&handle.id()).ok_or_else(|| {
            RasterError::ResourceNotFound(format!("buffer handle {} not found", handle.id()))
        })?;
        if !entry.usage.contains(mode.required_usage()) {
            return Err(RasterError::ResourceStateViolation(format!(
                "buffer handle {} usage {:?} does not grant {:?}",
                handle.id(),
                entry.usage,
                mode
            )));
        }
        if entry.state != BufferState::Unmapped {
            return Err(RasterError::ResourceStateViolation(format!(
                "buffer handle {} is not Unmapped",
                handle.id()
            )));
        }
        entry.state = BufferState::Pending;
        entry.pending = Some(Box::new(callback));
        Ok(())
    }

    /// Complete a pending map, if one exists, invoking its callback with
    /// `Success` exactly once.
    pub fn poll_map_async(&self, handle: Handle<Buffer>) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.get_mut(&handle.id()).ok_or_else(|| {
            RasterError::ResourceNotFound(format!("buffer handle {} not found", handle.id()))
        })?;
        if entry.state == BufferState::Pending {
            entry.state = BufferState::Mapped;
            if let Some(cb) = entry.pending.take() {
                cb(MapOutcome::Success);
            }
        }
        Ok(())
    }

    /// Returns to `Unmapped`. If a map was still `Pending`, its callback
    /// fires with `UnmappedBeforeCallback` first.
    pub fn unmap(&self, handle: Handle<Buffer>) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.get_mut(&handle.id()).ok_or_else(|| {
            RasterError::ResourceNotFound(format!("buffer handle {} not found", handle.id()))
        })?;
        if let Some(cb) = entry.pending.take() {
            cb(MapOutcome::UnmappedBeforeCallback);
        }
        entry.state = BufferState::Unmapped;
        Ok(())
    }

    pub fn read_mapped(&self, handle: Handle<Buffer>) -> Result<Vec<u8>> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(&handle.id()).ok_or_else(|| {
            RasterError::ResourceNotFound(format!("buffer handle {} not found", handle.id()))
        })?;
        if entry.state != BufferState::Mapped {
            return Err(RasterError::ResourceStateViolation(format!(
                "buffer handle {} is not Mapped",
                handle.id()
            )));
        }
        Ok(entry.data.clone())
    }
}
