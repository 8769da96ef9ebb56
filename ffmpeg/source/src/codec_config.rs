/*!
    Opaque codec configuration for passing to decoders.
*/

use ffmpeg_next::codec;

use ffmpeg_types::CodecId;

use crate::convert::codec_id_from_ffmpeg;

/**
    Opaque codec configuration extracted from a source stream.

    This holds the codec parameters needed to create a decoder.
    It's intentionally opaque to hide ffmpeg-next types from the public API.

    Pass this to `ffmpeg-decode` to create a decoder for this stream.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters) -> Self {
        Self { parameters }
    }

    /**
        The codec this stream is encoded with.
    */
    pub fn codec_id(&self) -> CodecId {
        codec_id_from_ffmpeg(self.parameters.id())
    }

    /**
        The raw FFmpeg codec identifier, for looking up a decoder.
    */
    pub fn ffmpeg_codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    /**
        Consume the config, returning the parameters for decoder setup.
    */
    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("codec_id", &self.codec_id())
            .finish_non_exhaustive()
    }
}
