use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::source_writer::SourceWriter;
use crate::recording::domain::recorder::{ReadyCallback, Recorder, RecorderError};

struct InputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

/// Captures the default input device into memory and saves the clip through
/// a `SourceWriter` when recording stops. Multi-channel input is downmixed
/// to mono.
pub struct CpalRecorder {
    output_path: PathBuf,
    writer: Box<dyn SourceWriter>,
    input: Option<InputDevice>,
    stream: Option<Stream>,
    captured: Arc<Mutex<Vec<f32>>>,
    current_file: Option<PathBuf>,
}

impl CpalRecorder {
    pub fn new(output_path: impl Into<PathBuf>, writer: Box<dyn SourceWriter>) -> Self {
        Self {
            output_path: output_path.into(),
            writer,
            input: None,
            stream: None,
            captured: Arc::new(Mutex::new(Vec::new())),
            current_file: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    fn save(&mut self, samples: Vec<f32>, sample_rate: u32) -> Result<PathBuf, RecorderError> {
        let audio = AudioSource::new(samples, sample_rate, 1);
        self.writer
            .write(&self.output_path, &audio)
            .map_err(|e| RecorderError::Write(e.to_string()))?;
        log::info!(
            "Saved {:.2}s recording to {}",
            audio.duration(),
            self.output_path.display()
        );
        self.current_file = Some(self.output_path.clone());
        Ok(self.output_path.clone())
    }
}

impl Recorder for CpalRecorder {
    fn initialize(&mut self, on_ready: ReadyCallback) {
        let host = cpal::default_host();
        let Some(device) = host.default_input_device() else {
            log::warn!("No input device available");
            on_ready(Err(RecorderError::PermissionDenied));
            return;
        };
        match device.default_input_config() {
            Ok(config) => {
                log::info!(
                    "Input ready: {} Hz, {} channel(s), {:?}",
                    config.sample_rate().0,
                    config.channels(),
                    config.sample_format()
                );
                self.input = Some(InputDevice { device, config });
                on_ready(Ok(()));
            }
            Err(e) => {
                log::error!("Failed to query input config: {}", e);
                on_ready(Err(RecorderError::Unavailable(e.to_string())));
            }
        }
    }

    fn record(&mut self) -> Result<(), RecorderError> {
        let input = self.input.as_ref().ok_or(RecorderError::NotInitialized)?;
        if self.stream.is_some() {
            return Ok(());
        }
        self.captured
            .lock()
            .map_err(|_| RecorderError::Capture("capture buffer poisoned".to_string()))?
            .clear();

        let config: StreamConfig = input.config.config();
        let captured = Arc::clone(&self.captured);
        let stream = match input.config.sample_format() {
            SampleFormat::F32 => build_input_stream::<f32>(&input.device, &config, captured)?,
            SampleFormat::I16 => build_input_stream::<i16>(&input.device, &config, captured)?,
            SampleFormat::U16 => build_input_stream::<u16>(&input.device, &config, captured)?,
            other => {
                return Err(RecorderError::Capture(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };
        stream
            .play()
            .map_err(|e| RecorderError::Capture(e.to_string()))?;

        log::info!("Recording started");
        self.stream = Some(stream);
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<PathBuf, RecorderError> {
        let sample_rate = self
            .input
            .as_ref()
            .ok_or(RecorderError::NotInitialized)?
            .config
            .sample_rate()
            .0;
        let stream = self
            .stream
            .take()
            .ok_or_else(|| RecorderError::Capture("not recording".to_string()))?;
        drop(stream);

        let samples = std::mem::take(
            &mut *self
                .captured
                .lock()
                .map_err(|_| RecorderError::Capture("capture buffer poisoned".to_string()))?,
        );
        self.save(samples, sample_rate)
    }

    fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    captured: Arc<Mutex<Vec<f32>>>,
) -> Result<Stream, RecorderError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buffer) = captured.lock() {
                    push_downmixed(data, channels, &mut buffer);
                }
            },
            move |err| {
                log::error!("Audio input error: {}", err);
            },
            None,
        )
        .map_err(|e| RecorderError::Capture(e.to_string()))
}

/// Appends the per-frame channel average of interleaved `data`.
fn push_downmixed<T>(data: &[T], channels: usize, out: &mut Vec<f32>)
where
    T: Sample,
    f32: FromSample<T>,
{
    out.extend(data.chunks(channels).map(|frame| {
        let sum: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum();
        sum / frame.len() as f32
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Remembers what it was asked to write.
    struct CapturingWriter {
        written: Arc<Mutex<Vec<(PathBuf, usize, u32)>>>,
        fail: bool,
    }

    impl SourceWriter for CapturingWriter {
        fn write(&self, path: &Path, audio: &AudioSource) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail {
                return Err("disk full".into());
            }
            self.written.lock().unwrap().push((
                path.to_path_buf(),
                audio.samples().len(),
                audio.sample_rate(),
            ));
            Ok(())
        }
    }

    fn recorder(fail: bool) -> (CpalRecorder, Arc<Mutex<Vec<(PathBuf, usize, u32)>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = CapturingWriter {
            written: Arc::clone(&written),
            fail,
        };
        (CpalRecorder::new("/tmp/recording.wav", Box::new(writer)), written)
    }

    #[test]
    fn test_record_before_initialize_fails() {
        let (mut recorder, _) = recorder(false);
        assert!(matches!(recorder.record(), Err(RecorderError::NotInitialized)));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_stop_before_initialize_fails() {
        let (mut recorder, _) = recorder(false);
        assert!(matches!(
            recorder.stop_recording(),
            Err(RecorderError::NotInitialized)
        ));
        assert_eq!(recorder.current_file(), None);
    }

    #[test]
    fn test_save_writes_mono_clip_and_sets_current_file() {
        let (mut recorder, written) = recorder(false);
        let path = recorder.save(vec![0.1; 4800], 48000).unwrap();

        assert_eq!(path, PathBuf::from("/tmp/recording.wav"));
        assert_eq!(recorder.current_file(), Some(Path::new("/tmp/recording.wav")));
        assert_eq!(
            written.lock().unwrap().as_slice(),
            &[(PathBuf::from("/tmp/recording.wav"), 4800, 48000)]
        );
    }

    #[test]
    fn test_save_failure_maps_to_write_error() {
        let (mut recorder, _) = recorder(true);
        let result = recorder.save(vec![0.0; 10], 48000);
        assert!(matches!(result, Err(RecorderError::Write(_))));
        assert_eq!(recorder.current_file(), None);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let mut out = Vec::new();
        push_downmixed(&[1.0f32, 0.0, 0.5, 0.5], 2, &mut out);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[1], 0.5);
    }

    #[test]
    fn test_downmix_converts_integer_samples() {
        let mut out = Vec::new();
        push_downmixed(&[i16::MIN, 0i16], 1, &mut out);
        assert_relative_eq!(out[0], -1.0);
        assert_relative_eq!(out[1], 0.0);
    }
}
