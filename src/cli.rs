use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "beatslide", about = "Music-synchronized slideshow video generator")]
pub struct Cli {
    /// Audio track driving the slide timing (WAV, MP3, FLAC, OGG)
    pub audio: Option<PathBuf>,

    /// Slide image; repeat the flag for each slide, in display order
    #[arg(short, long = "image")]
    pub images: Vec<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "slideshow.mp4")]
    pub output: PathBuf,

    /// Write the slide plan as JSON to this path
    #[arg(long)]
    pub plan_output: Option<PathBuf>,

    /// Stop after planning; no frames are rendered
    #[arg(long)]
    pub plan_only: bool,

    /// Number of slides (defaults to the number of images)
    #[arg(short, long)]
    pub num_slides: Option<usize>,

    /// Seconds per transition (defaults to the first style's own duration)
    #[arg(long)]
    pub transition_time: Option<f64>,

    /// Seconds of the closing fade to black
    #[arg(long, default_value_t = 3.0)]
    pub fade_out_time: f64,

    /// Seconds each slide holds when no audio is given
    #[arg(long, default_value_t = 2.0)]
    pub display_time: f64,

    /// Transition styles, cycled over the slides (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub transition: Vec<String>,

    /// Seed for the randomized transitions
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Grayscale image driving luma_wipe
    #[arg(long)]
    pub luma_map: Option<PathBuf>,

    /// Video width in pixels
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// List available transition styles and exit
    #[arg(long)]
    pub list_transitions: bool,

    /// Path to a TOML config file (auto-detects beatslide.toml if omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
