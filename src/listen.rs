//! Live audio capture into the analysis ring.

use std::sync::Arc;

use anyhow::Context;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    InputCallbackInfo,
};
use tracing::{info, warn};

use crate::core::{base::Res, config::EngineConfig, ring_buffer::RingBuffer};

/// Finds the capture device, preferring names containing `preferred` (an interface brand, or
/// "ASIO" on hosts that expose it that way), falling back to the system default input device.
pub fn find_input_device(preferred: Option<&str>) -> Res<cpal::Device> {
    let host = cpal::default_host();

    if let Some(fragment) = preferred {
        let mut devices = host.input_devices().context("Could not enumerate input devices.")?;

        if let Some(device) = devices.find(|device| device.name().map(|name| name.contains(fragment)).unwrap_or(false)) {
            info!("Capture device: {}", device.name().unwrap_or_else(|_| "<unknown>".to_owned()));
            return Ok(device);
        }

        warn!("No input device matching {:?}; falling back to the system default.", fragment);
    }

    let device = host.default_input_device().ok_or_else(|| anyhow::Error::msg("Failed to get default input device."))?;

    info!("Capture device: {}", device.name().unwrap_or_else(|_| "<unknown>".to_owned()));

    Ok(device)
}

/// Builds and starts the capture stream feeding the ring.
///
/// The stream is opened mono at the configured sample rate and block size. The callback runs on
/// the host's realtime thread, so its only duty is copying the block into the ring; it must
/// never block, allocate, or log.
///
/// The returned stream handle keeps the capture alive; drop it to stop the device.
pub fn start_capture(device: &cpal::Device, config: &EngineConfig, ring: Arc<RingBuffer>) -> Res<cpal::Stream> {
    let stream_config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
    };

    let stream = device.build_input_stream::<f32, _, _>(
        &stream_config,
        move |data: &[_], _: &InputCallbackInfo| {
            ring.write(data);
        },
        move |err| {
            // Dropped frames and device hiccups are reported here; log and carry on.
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;

    stream.play().context("Could not start the capture stream.")?;

    Ok(stream)
}
