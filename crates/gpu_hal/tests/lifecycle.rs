// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource-lifecycle and map-callback integration scenarios (HAL spec §8
//! scenario 6 and properties P7/P8), driven entirely through `Device`.

use std::sync::{Arc, Mutex};

use gpu_hal::buffer::{BufferState, MapOutcome};
use gpu_hal::{BufferUsage, Device, DeviceConfig, MapMode, RasterError};

const RW: BufferUsage = BufferUsage::MAP_READ.union(BufferUsage::MAP_WRITE);

#[test]
fn buffer_lifecycle_scenario() {
    let device = Device::new(DeviceConfig::default());
    let buffer = device.create_buffer(1024, RW).unwrap();

    assert_eq!(device.buffers.state(buffer).unwrap(), BufferState::Unmapped);

    let outcome = Arc::new(Mutex::new(None));
    let outcome2 = outcome.clone();
    device
        .buffers
        .map_async(buffer, MapMode::Read, move |o| {
            *outcome2.lock().unwrap() = Some(o)
        })
        .unwrap();
    assert_eq!(device.buffers.state(buffer).unwrap(), BufferState::Pending);

    device.buffers.poll_map_async(buffer).unwrap();
    assert_eq!(device.buffers.state(buffer).unwrap(), BufferState::Mapped);
    assert_eq!(*outcome.lock().unwrap(), Some(MapOutcome::Success));

    device.buffers.unmap(buffer).unwrap();
    assert_eq!(device.buffers.state(buffer).unwrap(), BufferState::Unmapped);

    device.buffers.destroy(buffer).unwrap();
    // Every subsequent destroy is a no-op that still reports the resource
    // as gone, per P7.
    assert!(matches!(
        device.buffers.destroy(buffer).unwrap_err(),
        RasterError::ResourceNotFound(_)
    ));
    assert!(matches!(
        device
            .buffers
            .map_async(buffer, MapMode::Read, |_| {})
            .unwrap_err(),
        RasterError::ResourceNotFound(_)
    ));
}

#[test]
fn map_callback_fires_exactly_once_on_success() {
    let device = Device::new(DeviceConfig::default());
    let buffer = device.create_buffer(16, RW).unwrap();

    let count = Arc::new(Mutex::new(0u32));
    let count2 = count.clone();
    device
        .buffers
        .map_async(buffer, MapMode::Read, move |_| *count2.lock().unwrap() += 1)
        .unwrap();

    device.buffers.poll_map_async(buffer).unwrap();
    // Polling again after the buffer is already Mapped must not re-fire.
    device.buffers.poll_map_async(buffer).unwrap();
    device.buffers.poll_map_async(buffer).unwrap();

    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn destroying_a_texture_silently_drops_its_default_view() {
    let device = Device::new(DeviceConfig::default());
    let (texture, view) = device.create_texture(gpu_hal::TextureDesc { width: 8, height: 8 });
    assert!(view.is_valid());
    device.textures.destroy(texture).unwrap();
    assert!(matches!(
        device.textures.destroy(texture).unwrap_err(),
        RasterError::ResourceNotFound(_)
    ));
}
