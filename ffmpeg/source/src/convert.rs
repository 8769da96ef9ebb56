/*!
    Conversion utilities between ffmpeg-next types and ffmpeg-types.

    Frame conversion copies plane by plane, dropping FFmpeg's row padding on
    the way in and restoring it on the way out.
*/

use ffmpeg_next::{codec::Id, format::Pixel, util::frame::video::Video as VideoFrameFFmpeg};

use ffmpeg_types::{CodecId, Error, MediaDuration, PixelFormat, Pts, Rational, Result, VideoFrame};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational {
        num: r.numerator(),
        den: r.denominator(),
    }
}

/**
    Convert our Rational to ffmpeg_next::Rational.
*/
pub fn rational_to_ffmpeg(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}

/**
    Convert ffmpeg_next pixel format to our PixelFormat.
*/
pub fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::YUVJ420P => Some(PixelFormat::Yuvj420p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::YUV420P10LE => Some(PixelFormat::Yuv420p10),
        _ => None,
    }
}

/**
    Convert our PixelFormat to ffmpeg_next's Pixel format.
*/
pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> Result<Pixel> {
    match format {
        PixelFormat::Yuv420p => Ok(Pixel::YUV420P),
        PixelFormat::Yuvj420p => Ok(Pixel::YUVJ420P),
        PixelFormat::Nv12 => Ok(Pixel::NV12),
        PixelFormat::Bgra => Ok(Pixel::BGRA),
        PixelFormat::Rgba => Ok(Pixel::RGBA),
        PixelFormat::Rgb24 => Ok(Pixel::RGB24),
        PixelFormat::Bgr24 => Ok(Pixel::BGR24),
        PixelFormat::Yuv422p => Ok(Pixel::YUV422P),
        PixelFormat::Yuv444p => Ok(Pixel::YUV444P),
        PixelFormat::Yuv420p10 => Ok(Pixel::YUV420P10LE),
        _ => Err(Error::unsupported_format(format!(
            "pixel format {format:?} not supported"
        ))),
    }
}

/**
    Convert ffmpeg_next codec ID to our CodecId.
*/
pub fn codec_id_from_ffmpeg(id: Id) -> CodecId {
    match id {
        Id::H264 => CodecId::H264,
        Id::HEVC => CodecId::H265,
        Id::VP8 => CodecId::Vp8,
        Id::VP9 => CodecId::Vp9,
        Id::AV1 => CodecId::Av1,
        Id::MPEG4 => CodecId::Mpeg4,
        Id::MPEG2VIDEO => CodecId::Mpeg2Video,
        _ => CodecId::Other,
    }
}

/**
    Convert our CodecId to ffmpeg_next's codec ID.
*/
pub fn codec_id_to_ffmpeg(codec: CodecId) -> Result<Id> {
    match codec {
        CodecId::H264 => Ok(Id::H264),
        CodecId::H265 => Ok(Id::HEVC),
        CodecId::Vp8 => Ok(Id::VP8),
        CodecId::Vp9 => Ok(Id::VP9),
        CodecId::Av1 => Ok(Id::AV1),
        CodecId::Mpeg4 => Ok(Id::MPEG4),
        CodecId::Mpeg2Video => Ok(Id::MPEG2VIDEO),
        _ => Err(Error::unsupported_format(format!(
            "codec {codec:?} has no FFmpeg identifier"
        ))),
    }
}

/**
    Create a Pts from an optional i64 timestamp.
*/
pub fn pts_from_ffmpeg(pts: Option<i64>) -> Option<Pts> {
    pts.map(Pts)
}

/**
    Copy an FFmpeg frame into a tightly packed VideoFrame.

    The PTS is taken verbatim from the frame; decoders that want the
    best-effort timestamp overwrite it afterwards.
*/
pub fn frame_from_ffmpeg(frame: &VideoFrameFFmpeg, time_base: Rational) -> Result<VideoFrame> {
    let width = frame.width();
    let height = frame.height();

    if width == 0 || height == 0 {
        return Err(Error::invalid_data("frame has zero dimensions"));
    }

    let ffmpeg_format = frame.format();
    let format = pixel_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported pixel format: {ffmpeg_format:?}"))
    })?;

    let mut data = Vec::with_capacity(format.frame_size(width, height));
    copy_from_ffmpeg(frame, format, &mut data)?;

    // SAFETY: reading a plain field of a valid AVFrame
    let duration = unsafe { (*frame.as_ptr()).duration };

    Ok(VideoFrame::new(
        data,
        width,
        height,
        format,
        pts_from_ffmpeg(frame.pts()),
        time_base,
    )
    .with_duration(MediaDuration(duration.max(0))))
}

/**
    Copy the planes of an FFmpeg frame into `out`, replacing its contents.

    The buffer's capacity is reused, which lets callers recycle frame storage.
*/
pub fn copy_from_ffmpeg(
    frame: &VideoFrameFFmpeg,
    format: PixelFormat,
    out: &mut Vec<u8>,
) -> Result<()> {
    out.clear();
    for (index, plane) in format.planes(frame.width(), frame.height()).iter().enumerate() {
        let stride = frame.stride(index);
        let source = frame.data(index);
        for row in 0..plane.rows {
            let start = row * stride;
            let bytes = source.get(start..start + plane.row_bytes).ok_or_else(|| {
                Error::invalid_data(format!("plane {index} is shorter than its layout"))
            })?;
            out.extend_from_slice(bytes);
        }
    }
    Ok(())
}

/**
    Copy a tightly packed VideoFrame into an already allocated FFmpeg frame.

    The destination must have the same geometry and pixel format.
*/
pub fn copy_into_ffmpeg(dst: &mut VideoFrameFFmpeg, src: &VideoFrame) -> Result<()> {
    if !src.has_complete_data() {
        return Err(Error::invalid_data(format!(
            "frame buffer of {} bytes is too small for {}x{} {:?}",
            src.data.len(),
            src.width,
            src.height,
            src.format
        )));
    }
    if dst.width() != src.width || dst.height() != src.height {
        return Err(Error::invalid_data(format!(
            "frame dimensions {}x{} don't match destination {}x{}",
            src.width,
            src.height,
            dst.width(),
            dst.height()
        )));
    }

    let mut offset = 0;
    for (index, plane) in src.format.planes(src.width, src.height).iter().enumerate() {
        let stride = dst.stride(index);
        let target = dst.data_mut(index);
        for row in 0..plane.rows {
            let from = offset + row * plane.row_bytes;
            let to = row * stride;
            target
                .get_mut(to..to + plane.row_bytes)
                .ok_or_else(|| Error::invalid_data(format!("destination plane {index} too small")))?
                .copy_from_slice(&src.data[from..from + plane.row_bytes]);
        }
        offset += plane.len();
    }

    Ok(())
}

/**
    Allocate an FFmpeg frame and copy a VideoFrame into it, timestamps included.
*/
pub fn frame_to_ffmpeg(frame: &VideoFrame) -> Result<VideoFrameFFmpeg> {
    let pixel = pixel_format_to_ffmpeg(frame.format)?;
    let mut output = VideoFrameFFmpeg::new(pixel, frame.width, frame.height);
    copy_into_ffmpeg(&mut output, frame)?;
    output.set_pts(frame.pts.map(|pts| pts.0));

    // SAFETY: writing a plain field of a frame we own
    unsafe {
        (*output.as_mut_ptr()).duration = frame.duration.0;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_formats_map_both_ways() {
        for format in [
            PixelFormat::Yuv420p,
            PixelFormat::Yuvj420p,
            PixelFormat::Nv12,
            PixelFormat::Rgba,
            PixelFormat::Bgra,
        ] {
            let pixel = pixel_format_to_ffmpeg(format).unwrap();
            assert_eq!(pixel_format_from_ffmpeg(pixel), Some(format));
        }
        assert_eq!(pixel_format_from_ffmpeg(Pixel::GRAY16BE), None);
    }

    #[test]
    fn codec_ids_map_both_ways() {
        assert_eq!(codec_id_from_ffmpeg(Id::VP9), CodecId::Vp9);
        assert_eq!(codec_id_to_ffmpeg(CodecId::H264).unwrap(), Id::H264);
        assert_eq!(codec_id_from_ffmpeg(Id::PNG), CodecId::Other);
        assert!(codec_id_to_ffmpeg(CodecId::Other).is_err());
    }

    #[test]
    fn rational_round_trips() {
        let r = rational_from_ffmpeg(rational_to_ffmpeg(Rational::new(30000, 1001)));
        assert_eq!(r, Rational::new(30000, 1001));
    }

    #[test]
    fn frame_copy_round_trips_through_ffmpeg() {
        let width = 6;
        let height = 4;
        let size = PixelFormat::Yuv420p.frame_size(width, height);
        let data: Vec<u8> = (0..size).map(|i| i as u8).collect();
        let frame = VideoFrame::new(
            data.clone(),
            width,
            height,
            PixelFormat::Yuv420p,
            Some(Pts(7)),
            Rational::new(1, 25),
        );

        let ffmpeg_frame = frame_to_ffmpeg(&frame).unwrap();
        let back = frame_from_ffmpeg(&ffmpeg_frame, Rational::new(1, 25)).unwrap();

        assert_eq!(back.data, data);
        assert_eq!(back.pts, Some(Pts(7)));
        assert_eq!((back.width, back.height), (width, height));
    }

    #[test]
    fn short_frame_is_rejected() {
        let frame = VideoFrame::new(vec![0; 10], 4, 4, PixelFormat::Rgba, None, Rational::new(1, 1));
        assert!(frame_to_ffmpeg(&frame).is_err());
    }
}
