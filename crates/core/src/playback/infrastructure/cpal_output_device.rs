use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use crate::playback::domain::output_device::{
    DeviceError, OutputDevice, RenderFn, RouteError, StreamFormat,
};

/// Output sink on the host's audio API via cpal.
///
/// The stream runs at the source's sample rate; source channels are spread
/// over the device's channels (mono is duplicated).
pub struct CpalOutputDevice {
    preferred_name: String,
    routed: Option<cpal::Device>,
    stream: Option<Stream>,
}

impl CpalOutputDevice {
    /// `preferred_name` is matched case-insensitively as a substring of the
    /// device names when routing.
    pub fn new(preferred_name: impl Into<String>) -> Self {
        Self {
            preferred_name: preferred_name.into(),
            routed: None,
            stream: None,
        }
    }
}

impl OutputDevice for CpalOutputDevice {
    fn route_to_speaker(&mut self) -> Result<(), RouteError> {
        self.routed = None;
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| RouteError::Enumerate(e.to_string()))?;

        let wanted = self.preferred_name.to_lowercase();
        for device in devices {
            let Ok(name) = device.name() else { continue };
            if name.to_lowercase().contains(&wanted) {
                log::info!("Routing output to {}", name);
                self.routed = Some(device);
                return Ok(());
            }
        }
        Err(RouteError::NotFound(self.preferred_name.clone()))
    }

    fn start(&mut self, format: StreamFormat, render: RenderFn) -> Result<(), DeviceError> {
        self.stop();

        let device = match self.routed.take() {
            Some(device) => device,
            None => cpal::default_host()
                .default_output_device()
                .ok_or(DeviceError::NoDevice)?,
        };

        let rate = format.sample_rate;
        let supported = device
            .supported_output_configs()
            .map_err(|e| DeviceError::UnsupportedFormat(e.to_string()))?
            .filter(|range| range.min_sample_rate().0 <= rate && rate <= range.max_sample_rate().0)
            // Prefer f32, then the fewest channels that still cover the source.
            .min_by_key(|range| {
                (
                    range.sample_format() != SampleFormat::F32,
                    range.channels() < format.channels,
                    range.channels(),
                )
            })
            .ok_or_else(|| {
                DeviceError::UnsupportedFormat(format!("{} Hz not supported", format.sample_rate))
            })?
            .with_sample_rate(cpal::SampleRate(rate));

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let source_channels = format.channels.max(1) as usize;

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, source_channels, render)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, source_channels, render)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, source_channels, render)?,
            other => {
                return Err(DeviceError::UnsupportedFormat(format!(
                    "sample format {:?}",
                    other
                )))
            }
        };
        stream.play().map_err(|e| DeviceError::Play(e.to_string()))?;

        log::info!(
            "Output stream started: {} Hz, {} device channel(s), {:?}",
            format.sample_rate,
            config.channels,
            sample_format
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause output stream: {}", e);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

fn build_stream<T: SizedSample + FromSample<f32>>(
    device: &cpal::Device,
    config: &StreamConfig,
    source_channels: usize,
    mut render: RenderFn,
) -> Result<Stream, DeviceError> {
    let device_channels = config.channels.max(1) as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / device_channels;
                scratch.resize(frames * source_channels, 0.0);
                render(&mut scratch[..]);

                for (out_frame, in_frame) in data
                    .chunks_exact_mut(device_channels)
                    .zip(scratch.chunks_exact(source_channels))
                {
                    for (ch, sample) in out_frame.iter_mut().enumerate() {
                        *sample = T::from_sample(in_frame[ch.min(source_channels - 1)]);
                    }
                }
            },
            move |err| {
                log::error!("Audio output error: {}", err);
            },
            None,
        )
        .map_err(|e| DeviceError::Build(e.to_string()))
}
