use std::path::Path;

use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::source_writer::SourceWriter;

/// Samples per encoded frame; PCM encoders accept any size.
const PCM_FRAME_SIZE: usize = 1024;

/// Writes a captured clip as 16-bit PCM WAV using ffmpeg-next.
pub struct FfmpegWavWriter;

impl SourceWriter for FfmpegWavWriter {
    fn write(&self, path: &Path, audio: &AudioSource) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let layout = match audio.channels() {
            1 => ffmpeg_next::ChannelLayout::MONO,
            2 => ffmpeg_next::ChannelLayout::STEREO,
            n => return Err(format!("Unsupported channel count for WAV output: {n}").into()),
        };
        let sample_format =
            ffmpeg_next::format::Sample::I16(ffmpeg_next::format::sample::Type::Packed);

        let mut octx = ffmpeg_next::format::output_as(path, "wav")?;

        let pcm_codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::PCM_S16LE)
            .ok_or("PCM s16le encoder not found")?;
        let mut ost = octx.add_stream(Some(pcm_codec))?;
        let stream_idx = ost.index();

        let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(pcm_codec)
            .encoder()
            .audio()?;
        encoder.set_rate(audio.sample_rate() as i32);
        encoder.set_channel_layout(layout);
        encoder.set_format(sample_format);

        let mut encoder = encoder.open_as(pcm_codec)?;
        ost.set_parameters(&encoder);

        let enc_time_base = encoder.time_base();

        octx.write_header()?;

        let ost_time_base = octx
            .stream(stream_idx)
            .ok_or("Output stream disappeared after header")?
            .time_base();

        let channels = audio.channels() as usize;
        let mut pts: i64 = 0;

        for chunk in audio.samples().chunks(PCM_FRAME_SIZE * channels) {
            let frames = chunk.len() / channels;
            let mut frame =
                ffmpeg_next::util::frame::audio::Audio::new(sample_format, frames, layout);
            frame.set_rate(audio.sample_rate());
            frame.set_pts(Some(pts));

            let pcm: Vec<u8> = chunk
                .iter()
                .flat_map(|s| ((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes())
                .collect();
            let dst = frame.data_mut(0);
            dst[..pcm.len()].copy_from_slice(&pcm);

            encoder.send_frame(&frame)?;
            flush_packets(&mut encoder, &mut octx, stream_idx, enc_time_base, ost_time_base)?;

            pts += frames as i64;
        }

        encoder.send_eof()?;
        flush_packets(&mut encoder, &mut octx, stream_idx, enc_time_base, ost_time_base)?;

        octx.write_trailer()?;
        log::info!(
            "Wrote {} frames at {} Hz to {}",
            audio.total_sample_length(),
            audio.sample_rate(),
            path.display()
        );
        Ok(())
    }
}

fn flush_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}
