/*!
    JSON job descriptions for the command line.
*/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::OutputCodec;
use crate::crop::CropKeyframe;
use crate::error::Result;
use crate::transcode::{DEFAULT_CRF, DEFAULT_TITLE, OutputSettings};
use crate::trim::TrimMarker;

/**
    Everything needed for one transcode.

    ```json
    {
        "input": "in.mp4",
        "output": "out.webm",
        "width": 720,
        "height": 720,
        "trim_markers": [{ "frame_number": 100, "trim_after": true }, { "frame_number": 200 }],
        "crop_keyframes": [{ "frame_number": 0, "rect": { "center_x": 960, "center_y": 540, "width": 720, "height": 720 } }]
    }
    ```
*/
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Guessed from the output extension when absent
    #[serde(default)]
    pub codec: Option<OutputCodec>,
    #[serde(default = "default_crf")]
    pub crf: u8,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_multiplier")]
    pub frame_rate_multiplier: f64,
    #[serde(default)]
    pub trim_markers: Vec<TrimMarker>,
    #[serde(default)]
    pub crop_keyframes: Vec<CropKeyframe>,
}

fn default_crf() -> u8 {
    DEFAULT_CRF
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_multiplier() -> f64 {
    1.0
}

impl TranscodeJob {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn output_settings(&self) -> OutputSettings {
        let mut settings = OutputSettings::new(&self.output, self.width, self.height)
            .with_crf(self.crf)
            .with_title(self.title.clone())
            .with_crop_keyframes(self.crop_keyframes.clone())
            .with_frame_rate_multiplier(self.frame_rate_multiplier);
        if let Some(codec) = self.codec {
            settings = settings.with_codec(codec);
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropRect;
    use crate::error::Error;
    use std::io::Write;

    const MINIMAL: &str = r#"{ "input": "in.mp4", "output": "out.mp4", "width": 640, "height": 360 }"#;

    #[test]
    fn minimal_job_gets_defaults() {
        let job = TranscodeJob::from_json(MINIMAL).unwrap();
        assert_eq!(job.codec, None);
        assert_eq!(job.crf, DEFAULT_CRF);
        assert_eq!(job.title, DEFAULT_TITLE);
        assert_eq!(job.frame_rate_multiplier, 1.0);
        assert!(job.trim_markers.is_empty());
        assert!(job.crop_keyframes.is_empty());

        let settings = job.output_settings();
        assert_eq!(settings.codec(), OutputCodec::H264);
        assert_eq!((settings.width, settings.height), (640, 360));
    }

    #[test]
    fn full_job_from_file() {
        let json = r#"{
            "input": "in.mp4",
            "output": "out.mkv",
            "codec": "vp9",
            "crf": 31,
            "width": 200,
            "height": 200,
            "title": "editor",
            "frame_rate_multiplier": 2.0,
            "trim_markers": [
                { "frame_number": 100, "trim_after": true },
                { "frame_number": 200 }
            ],
            "crop_keyframes": [
                { "frame_number": 0, "rect": { "center_x": 50, "center_y": 50, "width": 100, "height": 100 } }
            ]
        }"#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let job = TranscodeJob::from_path(file.path()).unwrap();
        assert_eq!(job.codec, Some(OutputCodec::Vp9));
        assert_eq!(
            job.trim_markers,
            vec![TrimMarker::new(100, true), TrimMarker::new(200, false)]
        );
        assert_eq!(
            job.crop_keyframes,
            vec![CropKeyframe::new(0, CropRect::new(50, 50, 100, 100))]
        );

        let settings = job.output_settings();
        assert_eq!(settings.codec(), OutputCodec::Vp9);
        assert_eq!(settings.crf, 31);
        assert_eq!(settings.title, "editor");
        assert_eq!(settings.frame_rate_multiplier, 2.0);
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            TranscodeJob::from_json("{ \"input\": 3 }"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TranscodeJob::from_path(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
