// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_camera_bridge::{
    frame::{FrameCache, FrameHandle, FrameTable},
    image::{Image, PixelLayout},
};
use std::{error::Error, sync::Arc, thread};

fn solid(value: u8) -> Arc<Image> {
    let img = Image::from_vec(64, 48, PixelLayout::Mono8, vec![value; 64 * 48])
        .unwrap_or_else(|_| Image::new(64, 48, PixelLayout::Mono8));
    Arc::new(img.with_block_id(u64::from(value)))
}

#[test]
fn test_publish_and_read() {
    let cache = FrameCache::new();
    assert!(cache.read_current().is_none());
    assert_eq!(cache.publish_count(), 0);

    assert!(cache.publish(solid(1)).is_none());
    let previous = cache.publish(solid(2));
    assert_eq!(previous.map(|f| f.block_id()), Some(1));
    assert_eq!(cache.read_current().map(|f| f.block_id()), Some(2));
    assert_eq!(cache.publish_count(), 2);

    cache.clear();
    assert!(cache.read_current().is_none());
    assert_eq!(cache.publish_count(), 2);
}

#[test]
fn test_reader_keeps_its_frame() -> Result<(), Box<dyn Error>> {
    let cache = FrameCache::new();
    cache.publish(solid(1));
    let held = cache.read_current().ok_or("no frame")?;

    for value in 2..10 {
        cache.publish(solid(value));
    }

    assert_eq!(held.block_id(), 1);
    assert!(held.data().iter().all(|&b| b == 1));
    Ok(())
}

#[test]
fn test_concurrent_readers_see_whole_frames() -> Result<(), Box<dyn Error>> {
    let cache = Arc::new(FrameCache::new());
    cache.publish(solid(0));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || -> Result<(), &'static str> {
                for _ in 0..2000 {
                    let frame = cache.read_current().ok_or("cache emptied")?;
                    let value = frame.block_id() as u8;
                    if !frame.data().iter().all(|&b| b == value) {
                        return Err("torn frame");
                    }
                }
                Ok(())
            })
        })
        .collect();

    for value in 1..=200u8 {
        cache.publish(solid(value));
    }

    for reader in readers {
        reader.join().map_err(|_| "reader panicked")??;
    }
    assert_eq!(cache.publish_count(), 201);
    Ok(())
}

#[test]
fn test_frame_table() -> Result<(), Box<dyn Error>> {
    let table = FrameTable::new();
    assert!(table.is_empty());

    let a = table.insert(solid(1));
    let b = table.insert(solid(1));
    assert_ne!(a, b);
    assert!(b > a);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(a).map(|f| f.block_id()), Some(1));

    assert!(table.release(a));
    assert!(!table.release(a));
    assert!(table.get(a).is_none());

    let c = table.insert(solid(3));
    assert!(c > b);

    table.clear();
    assert!(table.is_empty());
    assert!(table.get(b).is_none());
    Ok(())
}

#[test]
fn test_frame_handle_raw() {
    assert!(FrameHandle::from_raw(0).is_none());
    let handle = FrameHandle::from_raw(17);
    assert_eq!(handle.map(FrameHandle::get), Some(17));
    assert_eq!(handle.map(|h| h.to_string()), Some("frame#17".to_string()));
}
