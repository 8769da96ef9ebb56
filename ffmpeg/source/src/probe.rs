/*!
    Probing functionality for extracting media metadata.
*/

use std::path::Path;
use std::ptr;
use std::time::Duration;

use ffmpeg_next::{Stream, ffi, format::context::Input as InputContext, media::Type};

use ffmpeg_types::{Error, MediaInfo, Rational, Result, VideoStreamInfo};

use crate::convert::{codec_id_from_ffmpeg, pixel_format_from_ffmpeg, rational_from_ffmpeg};

/**
    Probe a media file to extract metadata without opening it for decoding.

    # Example

    ```ignore
    let info = probe("video.mp4")?;
    if let Some(video) = &info.video {
        println!("Video: {}x{}", video.width, video.height);
    }
    ```
*/
pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    let input_ctx = open_input(path.as_ref())?;
    extract_media_info(&input_ctx)
}

/**
    Open an input context, mapping a missing file to an I/O not-found error.
*/
pub(crate) fn open_input(path: &Path) -> Result<InputContext> {
    ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    ffmpeg_next::format::input(&path)
        .map_err(|e| Error::codec(format!("failed to open {}: {e}", path.display())))
}

/**
    Extract MediaInfo from an already-opened input context.
*/
pub(crate) fn extract_media_info(input_ctx: &InputContext) -> Result<MediaInfo> {
    let video = extract_video_stream_info(input_ctx)?;

    let duration = if input_ctx.duration() > 0 {
        Some(Duration::from_micros(input_ctx.duration() as u64))
    } else {
        video.as_ref().and_then(|v| v.duration)
    };

    Ok(MediaInfo {
        duration,
        format_name: input_ctx.format().name().to_string(),
        video,
    })
}

/**
    Guess the frame rate of a stream the way FFmpeg's own tools do.

    Falls back to the average and then the base frame rate when the guess
    comes back empty.
*/
pub(crate) fn guess_frame_rate(input_ctx: &InputContext, stream: &Stream) -> Option<Rational> {
    // SAFETY: av_guess_frame_rate only reads from the context and stream
    let guessed = unsafe {
        let rate = ffi::av_guess_frame_rate(
            input_ctx.as_ptr() as *mut ffi::AVFormatContext,
            stream.as_ptr() as *mut ffi::AVStream,
            ptr::null_mut(),
        );
        Rational {
            num: rate.num,
            den: rate.den,
        }
    };

    [
        guessed,
        rational_from_ffmpeg(stream.avg_frame_rate()),
        rational_from_ffmpeg(stream.rate()),
    ]
    .into_iter()
    .find(|rate| rate.is_valid() && rate.num > 0 && rate.den > 0)
}

fn extract_video_stream_info(input_ctx: &InputContext) -> Result<Option<VideoStreamInfo>> {
    let Some(stream) = input_ctx.streams().best(Type::Video) else {
        return Ok(None);
    };

    let time_base = rational_from_ffmpeg(stream.time_base());

    let duration = if stream.duration() > 0 && time_base.is_valid() {
        let seconds = stream.duration() as f64 * time_base.to_f64();
        Some(Duration::from_secs_f64(seconds))
    } else if input_ctx.duration() > 0 {
        Some(Duration::from_micros(input_ctx.duration() as u64))
    } else {
        None
    };

    // A throwaway decoder context is the simplest way to read geometry and format
    let decoder_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::codec(e.to_string()))?;
    let decoder = decoder_ctx
        .decoder()
        .video()
        .map_err(|e| Error::not_found(format!("no decoder for video stream: {e}")))?;

    let pixel_format = pixel_format_from_ffmpeg(decoder.format()).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported pixel format: {:?}", decoder.format()))
    })?;

    let sample_aspect_ratio = match rational_from_ffmpeg(decoder.aspect_ratio()) {
        sar if sar.is_valid() => sar,
        _ => Rational::new(1, 1),
    };

    // SAFETY: reading from a valid AVCodecParameters pointer that FFmpeg owns
    let (extradata, bitrate) = unsafe {
        let ptr = stream.parameters().as_ptr();

        let extradata = if (*ptr).extradata_size > 0 && !(*ptr).extradata.is_null() {
            let slice =
                std::slice::from_raw_parts((*ptr).extradata, (*ptr).extradata_size as usize);
            Some(slice.to_vec())
        } else {
            None
        };

        let bitrate = ((*ptr).bit_rate > 0).then_some((*ptr).bit_rate as u64);

        (extradata, bitrate)
    };

    Ok(Some(VideoStreamInfo {
        width: decoder.width(),
        height: decoder.height(),
        pixel_format,
        frame_rate: guess_frame_rate(input_ctx, &stream),
        time_base,
        sample_aspect_ratio,
        duration,
        codec_id: codec_id_from_ffmpeg(stream.parameters().id()),
        extradata,
        bitrate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_not_found() {
        let err = probe("/nonexistent/clip.mp4").unwrap_err();
        assert!(matches!(err, Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn source_open_reports_missing_file() {
        let result = crate::Source::open("/nonexistent/clip.mp4", crate::SourceConfig::default());
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
