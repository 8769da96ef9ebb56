/*!
    Sink configuration types.
*/

use std::path::Path;

/**
    Output container format.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Mp4,
    Webm,
    Matroska,
}

impl ContainerFormat {
    /**
        Infer the container from a file extension, case-insensitively.
    */
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "mp4" | "m4v" | "mov" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "mkv" => Some(Self::Matroska),
            _ => None,
        }
    }

    /**
        The FFmpeg muxer name.
    */
    pub fn muxer_name(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Matroska => "matroska",
        }
    }
}

/**
    Configuration for a sink.
*/
#[derive(Clone, Debug, Default)]
pub struct SinkConfig {
    /// Container format (None = guess from the file name).
    pub format: Option<ContainerFormat>,
    /// Written as the `encoder-app` metadata tag.
    pub title: Option<String>,
    /// Print the container layout to FFmpeg's log before writing the header.
    pub dump_format: bool,
}

impl SinkConfig {
    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_dump_format(mut self, enabled: bool) -> Self {
        self.dump_format = enabled;
        self
    }
}
