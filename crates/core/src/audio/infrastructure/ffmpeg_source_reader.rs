use std::path::Path;

use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::source_reader::{SourceOpenError, SourceReader};

/// Decodes a recorded clip with ffmpeg-next.
///
/// The clip is downmixed to mono f32 at its native sample rate, so the
/// completion estimate can work in the file's own sample clock.
pub struct FfmpegSourceReader;

impl SourceReader for FfmpegSourceReader {
    fn open(&self, path: &Path) -> Result<AudioSource, SourceOpenError> {
        if !path.exists() {
            return Err(SourceOpenError::NotFound(path.to_path_buf()));
        }
        let decode_err = |e: ffmpeg_next::Error| SourceOpenError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        ffmpeg_next::init().map_err(decode_err)?;

        let mut ictx = ffmpeg_next::format::input(path).map_err(decode_err)?;

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| SourceOpenError::NoAudioTrack(path.to_path_buf()))?;
        let audio_stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())
                .map_err(decode_err)?;
        let mut decoder = codec_ctx.decoder().audio().map_err(decode_err)?;

        let sample_rate = decoder.rate();
        if sample_rate == 0 {
            return Err(SourceOpenError::Decode {
                path: path.to_path_buf(),
                message: "stream reports a sample rate of 0".to_string(),
            });
        }

        // Raw PCM containers often leave the layout unset.
        let input_layout = if decoder.channel_layout().is_empty() {
            ffmpeg_next::ChannelLayout::default(decoder.channels() as i32)
        } else {
            decoder.channel_layout()
        };

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            input_layout,
            sample_rate,
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            sample_rate,
        )
        .map_err(decode_err)?;

        let mut all_samples: Vec<f32> = Vec::new();
        let mut decoded_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled_frame = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }

            decoder.send_packet(&packet).map_err(decode_err)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                resampler
                    .run(&decoded_frame, &mut resampled_frame)
                    .map_err(decode_err)?;
                extract_f32_samples(&resampled_frame, &mut all_samples);
            }
        }

        decoder.send_eof().map_err(decode_err)?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            resampler
                .run(&decoded_frame, &mut resampled_frame)
                .map_err(decode_err)?;
            extract_f32_samples(&resampled_frame, &mut all_samples);
        }

        if let Ok(Some(delay)) = resampler.flush(&mut resampled_frame) {
            if delay.output > 0 {
                extract_f32_samples(&resampled_frame, &mut all_samples);
            }
        }

        log::info!(
            "Opened {} ({} frames at {} Hz)",
            path.display(),
            all_samples.len(),
            sample_rate
        );

        Ok(AudioSource::new(all_samples, sample_rate, 1))
    }
}

/// Extract f32 samples from a planar mono resampled frame.
fn extract_f32_samples(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}
