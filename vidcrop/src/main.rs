use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ffmpeg_types::PixelFormat;

use vidcrop::{PreviewConfig, PreviewReader, TranscodeJob, Transcoder};

/**
    Trim, crop and re-encode video files.
*/
#[derive(Parser)]
#[command(name = "vidcrop")]
struct Cli {
    /// More log output (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the video stream of a file.
    Probe {
        /// Media file to inspect.
        path: PathBuf,
    },
    /// Run a JSON transcode job.
    Transcode {
        /// Job description file.
        job: PathBuf,
    },
    /// Save the frame at a position as PNG.
    Still {
        /// Media file to read.
        input: PathBuf,

        /// Position in seconds.
        #[arg(short, long, default_value = "0")]
        at: f64,

        /// PNG file to write.
        #[arg(short, long)]
        output: PathBuf,

        /// Shrink the frame to fit this many pixels on each side.
        #[arg(long)]
        max_size: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    vidcrop::logging::init(cli.verbose);

    match cli.command {
        Command::Probe { path } => cmd_probe(&path, cli.verbose > 0),
        Command::Transcode { job } => cmd_transcode(&job, cli.verbose > 0),
        Command::Still {
            input,
            at,
            output,
            max_size,
        } => cmd_still(&input, at, &output, max_size),
    }
}

fn cmd_probe(path: &Path, dump_format: bool) -> Result<()> {
    let info = ffmpeg_source::probe(path).context("failed to probe input")?;
    if !info.has_video() {
        bail!("{} has no video stream", path.display());
    }
    let transcoder = Transcoder::open_input(path, dump_format).context("failed to open input")?;
    let video = transcoder.stream_info();

    println!("Container:   {}", info.format_name);
    match transcoder.media_duration() {
        Duration::MAX => println!("Duration:    unknown"),
        duration => println!("Duration:    {:.3}s", duration.as_secs_f64()),
    }
    println!("Codec:       {}", video.codec_id);
    println!(
        "Size:        {}x{} ({:.3}:1)",
        video.width,
        video.height,
        video.aspect_ratio()
    );
    println!("Pixels:      {:?}", video.pixel_format);
    println!(
        "Frame rate:  {} ({:.3} fps)",
        transcoder.frame_rate(),
        video.fps().unwrap_or_default()
    );
    println!("Time base:   {}", video.time_base);
    println!("Threading:   {}", transcoder.threading());

    Ok(())
}

fn cmd_transcode(job_path: &Path, dump_format: bool) -> Result<()> {
    let job = TranscodeJob::from_path(job_path)
        .with_context(|| format!("failed to read job {}", job_path.display()))?;

    let mut transcoder =
        Transcoder::open_input(&job.input, dump_format).context("failed to open input")?;
    transcoder
        .set_trim_markers(&job.trim_markers)
        .context("invalid trim markers")?;
    transcoder
        .open_output(job.output_settings().with_dump_format(dump_format))
        .context("failed to open output")?;

    let mut last_percent = None;
    let summary = transcoder.run(|progress| {
        let percent = (progress.fraction() * 100.0) as u32;
        if last_percent != Some(percent) {
            last_percent = Some(percent);
            eprint!("\r{percent:3}%");
        }
        ControlFlow::Continue(())
    })?;
    eprintln!();

    transcoder.close().context("failed to finish output")?;

    println!(
        "Wrote {} ({} frames read, {} encoded, {} packets)",
        job.output.display(),
        summary.frames_read,
        summary.frames_encoded,
        summary.packets_written
    );
    Ok(())
}

fn cmd_still(input: &Path, at: f64, output: &Path, max_size: Option<u32>) -> Result<()> {
    if !at.is_finite() || at < 0.0 {
        bail!("position must be a non-negative number of seconds");
    }

    let mut config = PreviewConfig::default().with_display_format(PixelFormat::Rgba);
    if let Some(side) = max_size {
        config = config.with_max_size(side, side);
    }

    let mut reader = PreviewReader::open(input, config).context("failed to open input")?;
    reader.set_position(Duration::from_secs_f64(at))?;

    let frame = reader
        .current_frame()
        .context("no frame at that position")?;
    vidcrop::save_still(frame, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {}x{} frame at {:.3}s to {}",
        frame.width,
        frame.height,
        reader.position().as_secs_f64(),
        output.display()
    );
    Ok(())
}
