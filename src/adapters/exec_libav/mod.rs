//! FFmpeg media adapter using libav bindings
//!
//! One [`LibavSource`] wraps one demuxer context for the whole run; every clip
//! seeks inside that same context. Two export paths exist:
//!
//! - copy: packets are remuxed starting at the keyframe at or before the
//!   requested start, so the clip may begin slightly early;
//! - reencode: video is decoded from that keyframe, frames outside the range
//!   are dropped and the rest re-encoded with the configured encoder. Audio
//!   packets are copied.

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use ffmpeg::codec::packet::Packet;
use ffmpeg::codec::{self, decoder, encoder};
use ffmpeg::{format, media, rescale, Dictionary, Rational, Rescale};
use tracing::{debug, info};

use crate::config::{ExportMode, ExportSettings};
use crate::domain::model::ClipRange;
use crate::error::{ClipEditorError, ClipEditorResult};
use crate::ports::{MediaPort, SourceVideo};

/// Opens source videos through libavformat
#[derive(Debug)]
pub struct LibavMediaPort;

impl LibavMediaPort {
    pub fn new() -> ClipEditorResult<Self> {
        ffmpeg::init()
            .map_err(|e| ClipEditorError::media(format!("FFmpeg initialization failed: {}", e)))?;
        ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
        Ok(Self)
    }
}

impl MediaPort for LibavMediaPort {
    type Source = LibavSource;

    fn open(&self, path: &Path, export: &ExportSettings) -> ClipEditorResult<LibavSource> {
        let not_found = |message: String| ClipEditorError::SourceNotFound {
            path: path.display().to_string(),
            message,
        };
        if !path.is_file() {
            return Err(not_found("no such file".to_string()));
        }

        let input = format::input(&path).map_err(|e| not_found(e.to_string()))?;
        let video_stream = input
            .streams()
            .best(media::Type::Video)
            .map(|stream| stream.index())
            .ok_or_else(|| not_found("no video stream".to_string()))?;

        let source = LibavSource {
            path: path.to_path_buf(),
            input,
            video_stream,
            export: export.clone(),
        };
        info!(
            "Opened source video {} ({} streams, duration {})",
            path.display(),
            source.input.nb_streams(),
            source
                .duration()
                .map(|d| format!("{:.2}s", d))
                .unwrap_or_else(|| "unknown".to_string())
        );
        Ok(source)
    }
}

/// An open source video; the demuxer is closed when this is dropped
pub struct LibavSource {
    path: PathBuf,
    input: format::context::Input,
    video_stream: usize,
    export: ExportSettings,
}

impl SourceVideo for LibavSource {
    fn duration(&self) -> Option<f64> {
        let duration = self.input.duration();
        if duration <= 0 {
            return None;
        }
        Some(duration as f64 / ffmpeg::ffi::AV_TIME_BASE as f64)
    }

    fn export_range(&mut self, range: &ClipRange, output: &Path) -> ClipEditorResult<()> {
        debug!(
            "Exporting {} of {} to {} ({:?})",
            range,
            self.path.display(),
            output.display(),
            self.export.mode
        );
        match self.export.mode {
            ExportMode::Copy => self.remux_range(range, output),
            ExportMode::Reencode => self.transcode_range(range, output),
        }
    }
}

impl Drop for LibavSource {
    fn drop(&mut self) {
        debug!("Closing demuxer for {}", self.path.display());
    }
}

fn to_av_time(seconds: f64) -> i64 {
    (seconds * ffmpeg::ffi::AV_TIME_BASE as f64) as i64
}

fn media_err(e: ffmpeg::Error) -> ClipEditorError {
    ClipEditorError::media(e)
}

fn write_err(output: &Path) -> impl Fn(ffmpeg::Error) -> ClipEditorError + '_ {
    move |e| ClipEditorError::Write {
        path: output.display().to_string(),
        message: e.to_string(),
    }
}

/// Add a stream-copy output stream mirroring `ist`
fn add_copy_stream(
    octx: &mut format::context::Output,
    ist: &format::stream::Stream,
) -> ClipEditorResult<()> {
    let mut ost = octx
        .add_stream(encoder::find(codec::Id::None))
        .map_err(media_err)?;
    ost.set_parameters(ist.parameters());
    Ok(())
}

/// Shift a copied packet so `origin_us` becomes zero and route it to `ost_index`
fn write_shifted(
    mut packet: Packet,
    origin_us: i64,
    ist_tb: Rational,
    ost_tb: Rational,
    ost_index: usize,
    octx: &mut format::context::Output,
) -> Result<(), ffmpeg::Error> {
    let offset = origin_us.rescale(rescale::TIME_BASE, ist_tb);
    packet.set_pts(packet.pts().map(|pts| pts - offset));
    packet.set_dts(packet.dts().map(|dts| dts - offset));
    packet.rescale_ts(ist_tb, ost_tb);
    packet.set_position(-1);
    packet.set_stream(ost_index);
    packet.write_interleaved(octx)
}

impl LibavSource {
    fn remux_range(&mut self, range: &ClipRange, output: &Path) -> ClipEditorResult<()> {
        let video_index = self.video_stream;
        let ictx = &mut self.input;
        let mut octx = format::output(&output).map_err(write_err(output))?;

        let stream_count = ictx.nb_streams() as usize;
        let mut stream_mapping: Vec<Option<usize>> = vec![None; stream_count];
        let mut ist_time_bases = vec![Rational(0, 1); stream_count];
        let mut next_ost = 0;
        for (ist_index, ist) in ictx.streams().enumerate() {
            let medium = ist.parameters().medium();
            if medium != media::Type::Video && medium != media::Type::Audio {
                continue;
            }
            add_copy_stream(&mut octx, &ist)?;
            stream_mapping[ist_index] = Some(next_ost);
            ist_time_bases[ist_index] = ist.time_base();
            next_ost += 1;
        }

        octx.set_metadata(ictx.metadata().to_owned());
        octx.write_header().map_err(write_err(output))?;
        let ost_time_bases: Vec<Rational> = octx.streams().map(|s| s.time_base()).collect();

        let start_us = to_av_time(range.start_seconds());
        let end_us = to_av_time(range.end_seconds());
        ictx.seek(start_us, ..start_us).map_err(media_err)?;

        // Output time zero is the first video keyframe reached after seeking.
        let mut origin_us: Option<i64> = None;
        for (stream, packet) in ictx.packets() {
            let ist_index = stream.index();
            let Some(ost_index) = stream_mapping.get(ist_index).copied().flatten() else {
                continue;
            };
            let ist_tb = ist_time_bases[ist_index];
            let Some(ts) = packet.pts().or(packet.dts()) else {
                continue;
            };
            let ts_us = ts.rescale(ist_tb, rescale::TIME_BASE);

            if ts_us >= end_us {
                if ist_index == video_index {
                    break;
                }
                continue;
            }

            let origin = match origin_us {
                Some(origin) => origin,
                None if ist_index == video_index && packet.is_key() => {
                    let dts_us = packet
                        .dts()
                        .map(|dts| dts.rescale(ist_tb, rescale::TIME_BASE))
                        .unwrap_or(ts_us);
                    origin_us = Some(dts_us);
                    dts_us
                }
                None => continue,
            };
            if ts_us < origin {
                continue;
            }

            write_shifted(
                packet,
                origin,
                ist_tb,
                ost_time_bases[ost_index],
                ost_index,
                &mut octx,
            )
            .map_err(write_err(output))?;
        }

        if origin_us.is_none() {
            return Err(ClipEditorError::media(format!(
                "no video keyframe found for {}",
                range
            )));
        }
        octx.write_trailer().map_err(write_err(output))?;
        Ok(())
    }

    fn transcode_range(&mut self, range: &ClipRange, output: &Path) -> ClipEditorResult<()> {
        let video_index = self.video_stream;
        let export = self.export.clone();
        let ictx = &mut self.input;
        let mut octx = format::output(&output).map_err(write_err(output))?;

        let start_us = to_av_time(range.start_seconds());
        let end_us = to_av_time(range.end_seconds());

        let mut transcoder = {
            let ist = ictx
                .stream(video_index)
                .ok_or_else(|| ClipEditorError::media("video stream disappeared"))?;
            VideoTranscoder::new(&ist, &mut octx, &export, start_us, end_us)?
        };

        let stream_count = ictx.nb_streams() as usize;
        let mut audio_mapping: Vec<Option<usize>> = vec![None; stream_count];
        let mut ist_time_bases = vec![Rational(0, 1); stream_count];
        let mut next_ost = 1;
        for (ist_index, ist) in ictx.streams().enumerate() {
            if ist.parameters().medium() != media::Type::Audio {
                continue;
            }
            add_copy_stream(&mut octx, &ist)?;
            audio_mapping[ist_index] = Some(next_ost);
            ist_time_bases[ist_index] = ist.time_base();
            next_ost += 1;
        }

        octx.set_metadata(ictx.metadata().to_owned());
        octx.write_header().map_err(write_err(output))?;
        let ost_time_bases: Vec<Rational> = octx.streams().map(|s| s.time_base()).collect();
        transcoder.ost_time_base = ost_time_bases[0];

        ictx.seek(start_us, ..start_us).map_err(media_err)?;

        for (stream, packet) in ictx.packets() {
            let ist_index = stream.index();
            if ist_index == video_index {
                transcoder.decoder.send_packet(&packet).map_err(media_err)?;
                if transcoder.drain_frames(&mut octx, output)? {
                    break;
                }
                continue;
            }

            let Some(ost_index) = audio_mapping.get(ist_index).copied().flatten() else {
                continue;
            };
            let ist_tb = ist_time_bases[ist_index];
            let Some(pts) = packet.pts() else {
                continue;
            };
            let pts_us = pts.rescale(ist_tb, rescale::TIME_BASE);
            if pts_us < start_us || pts_us >= end_us {
                continue;
            }
            write_shifted(
                packet,
                start_us,
                ist_tb,
                ost_time_bases[ost_index],
                ost_index,
                &mut octx,
            )
            .map_err(write_err(output))?;
        }

        transcoder.decoder.send_eof().map_err(media_err)?;
        transcoder.drain_frames(&mut octx, output)?;
        transcoder.encoder.send_eof().map_err(media_err)?;
        transcoder.drain_packets(&mut octx, output)?;

        if transcoder.frames_encoded == 0 {
            return Err(ClipEditorError::media(format!(
                "no video frames decoded for {}",
                range
            )));
        }
        octx.write_trailer().map_err(write_err(output))?;
        debug!("Re-encoded {} frames", transcoder.frames_encoded);
        Ok(())
    }
}

/// Decoder/encoder pair for the video stream of one clip
struct VideoTranscoder {
    decoder: decoder::Video,
    encoder: encoder::video::Encoder,
    ist_time_base: Rational,
    ost_time_base: Rational,
    start_pts: i64,
    end_pts: i64,
    frames_encoded: usize,
}

impl VideoTranscoder {
    /// Output stream 0 is the re-encoded video
    fn new(
        ist: &format::stream::Stream,
        octx: &mut format::context::Output,
        export: &ExportSettings,
        start_us: i64,
        end_us: i64,
    ) -> ClipEditorResult<Self> {
        let ist_time_base = ist.time_base();
        let decoder = codec::context::Context::from_parameters(ist.parameters())
            .map_err(media_err)?
            .decoder()
            .video()
            .map_err(media_err)?;

        let codec = encoder::find_by_name(&export.vcodec).ok_or_else(|| {
            ClipEditorError::media(format!("encoder '{}' is not available", export.vcodec))
        })?;
        let global_header = octx
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);

        let mut ost = octx.add_stream(codec).map_err(media_err)?;
        let mut video = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(media_err)?;
        video.set_width(decoder.width());
        video.set_height(decoder.height());
        video.set_aspect_ratio(decoder.aspect_ratio());
        video.set_format(decoder.format());
        video.set_frame_rate(decoder.frame_rate());
        video.set_time_base(ist_time_base);
        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let mut options = Dictionary::new();
        options.set("preset", &export.compression);
        options.set("crf", &export.crf.to_string());
        options.set("threads", &export.threads.to_string());
        let encoder = video.open_with(options).map_err(media_err)?;
        ost.set_parameters(&encoder);

        Ok(Self {
            decoder,
            encoder,
            ist_time_base,
            ost_time_base: ist_time_base,
            start_pts: start_us.rescale(rescale::TIME_BASE, ist_time_base),
            end_pts: end_us.rescale(rescale::TIME_BASE, ist_time_base),
            frames_encoded: 0,
        })
    }

    /// Feed decoded in-range frames to the encoder; true once past the end
    fn drain_frames(
        &mut self,
        octx: &mut format::context::Output,
        output: &Path,
    ) -> ClipEditorResult<bool> {
        let mut frame = ffmpeg::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut frame).is_ok() {
            let Some(pts) = frame.timestamp() else {
                continue;
            };
            if pts < self.start_pts {
                continue;
            }
            if pts >= self.end_pts {
                return Ok(true);
            }
            frame.set_pts(Some(pts - self.start_pts));
            frame.set_kind(ffmpeg::util::picture::Type::None);
            self.encoder.send_frame(&frame).map_err(media_err)?;
            self.frames_encoded += 1;
            self.drain_packets(octx, output)?;
        }
        Ok(false)
    }

    fn drain_packets(
        &mut self,
        octx: &mut format::context::Output,
        output: &Path,
    ) -> ClipEditorResult<()> {
        let mut encoded = Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.ist_time_base, self.ost_time_base);
            encoded
                .write_interleaved(octx)
                .map_err(write_err(output))?;
        }
        Ok(())
    }
}
