/*!
    Log setup for the command line.
*/

use ffmpeg_next::util::log::Level as FfmpegLevel;

/**
    Default filter directives for a `-v` count.
*/
pub fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "vidcrop=info,ffmpeg_source=warn,ffmpeg_decode=warn,ffmpeg_filter=warn,ffmpeg_encode=warn,ffmpeg_sink=warn",
        1 => "vidcrop=debug,ffmpeg_source=debug,ffmpeg_decode=debug,ffmpeg_filter=debug,ffmpeg_encode=debug,ffmpeg_sink=debug,ffmpeg_transform=debug",
        _ => "vidcrop=trace,ffmpeg_source=trace,ffmpeg_decode=trace,ffmpeg_filter=trace,ffmpeg_encode=trace,ffmpeg_sink=trace,ffmpeg_transform=trace",
    }
}

/**
    FFmpeg's own log level for a `-v` count.
*/
pub fn ffmpeg_level(verbosity: u8) -> FfmpegLevel {
    match verbosity {
        0 => FfmpegLevel::Error,
        1 => FfmpegLevel::Info,
        _ => FfmpegLevel::Debug,
    }
}

/**
    Install the tracing subscriber and set FFmpeg's log level.

    `RUST_LOG` overrides the defaults. Returns false when another
    subscriber was already installed; that one stays in charge.
*/
pub fn init(verbosity: u8) -> bool {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_directives(verbosity).to_string());

    let installed = match tracing_subscriber::fmt()
        .with_env_filter(env_filter.as_str())
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "keeping the existing tracing subscriber");
            false
        }
    };

    ffmpeg_next::util::log::set_level(ffmpeg_level(verbosity));
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_levels() {
        assert!(default_directives(0).starts_with("vidcrop=info"));
        assert!(default_directives(1).starts_with("vidcrop=debug"));
        assert!(default_directives(5).starts_with("vidcrop=trace"));
        assert!(matches!(ffmpeg_level(0), FfmpegLevel::Error));
        assert!(matches!(ffmpeg_level(3), FfmpegLevel::Debug));
    }

    #[test]
    fn second_init_keeps_the_first_subscriber() {
        init(0);
        assert!(!init(2));
    }
}
