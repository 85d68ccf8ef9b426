mod audio;
mod cli;
mod config;
mod encode;
mod render;
mod timing;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use audio::analysis::{DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE};
use cli::Cli;
use encode::ffmpeg::{EncoderSettings, FfmpegEncoder};
use render::timeline::Timeline;
use render::transitions::{TransitionStyle, STYLE_NAMES};
use timing::allocate::AllocatorConfig;
use timing::novelty::NoveltyConfig;
use timing::plan::SlidePlan;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect beatslide.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("beatslide.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("beatslide").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("beatslide").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut fft_size = DEFAULT_FFT_SIZE;
    let mut hop_size = DEFAULT_HOP_SIZE;
    let mut novelty = NoveltyConfig::default();
    let mut allocator = AllocatorConfig::default();
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 1920 { cli.width = cfg.output.width; }
            if cli.height == 1080 { cli.height = cfg.output.height; }
            if cli.fps == 30 { cli.fps = cfg.output.fps; }
            if cli.crf == 18 { cli.crf = cfg.output.crf; }
            if cli.codec == "libx264" { cli.codec = cfg.output.codec; }
            if cli.bitrate.is_none() { cli.bitrate = cfg.output.bitrate; }
            if cli.num_slides.is_none() { cli.num_slides = cfg.timing.num_slides; }
            if cli.transition_time.is_none() { cli.transition_time = cfg.timing.transition_time; }
            if cli.fade_out_time == 3.0 { cli.fade_out_time = cfg.timing.fade_out_time; }
            if cli.display_time == 2.0 { cli.display_time = cfg.timing.display_time; }
            if cli.transition.is_empty() { cli.transition = cfg.transitions.styles; }
            if cli.seed == 0 {
                cli.seed = cfg.transitions.seed.unwrap_or(0);
            }
            if cli.luma_map.is_none() {
                cli.luma_map = cfg.transitions.luma_map;
            }
            fft_size = cfg.audio.fft_size;
            hop_size = cfg.audio.hop_size;
            novelty = cfg.novelty;
            allocator = cfg.timing.allocator;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    // List transitions mode
    if cli.list_transitions {
        println!("Available transitions:");
        for name in STYLE_NAMES {
            let style = TransitionStyle::resolve(name);
            println!("  {:<20} {:.1}s", name, style.default_duration());
        }
        return Ok(());
    }

    let num_slides = cli.num_slides.unwrap_or(cli.images.len());
    if num_slides == 0 {
        anyhow::bail!("Nothing to show: pass --image files or --num-slides");
    }

    let styles: Vec<TransitionStyle> = if cli.transition.is_empty() {
        vec![TransitionStyle::Fade]
    } else {
        cli.transition.iter().map(|name| TransitionStyle::resolve(name)).collect()
    };
    let transition_time = cli
        .transition_time
        .unwrap_or_else(|| styles[0].default_duration());

    log::info!("beatslide - music-synchronized slideshow generator");
    log::info!("Slides: {}, transition {:.2}s, fade-out {:.2}s", num_slides, transition_time, cli.fade_out_time);

    // 1. Plan slide timing
    let mut plan = match cli.audio {
        Some(ref audio_path) => {
            if !audio_path.exists() {
                anyhow::bail!("Audio file not found: {}", audio_path.display());
            }
            log::info!("Decoding audio...");
            let track = audio::decode::decode_audio(audio_path)
                .with_context(|| format!("Failed to load audio: {}", audio_path.display()))?;
            log::info!("Analyzing audio...");
            let features = audio::analysis::analyze(&track, fft_size, hop_size);
            log::info!(
                "Duration: {:.1}s, tempo {:.1} BPM, {} beats",
                features.duration,
                features.tempo_bpm,
                features.beat_times.len()
            );
            timing::plan_slides(
                &features,
                num_slides,
                transition_time,
                cli.fade_out_time,
                &novelty,
                &allocator,
            )
        }
        None => {
            log::info!("No audio given, every slide holds {:.2}s", cli.display_time);
            SlidePlan::fixed(num_slides, cli.display_time, transition_time, cli.fade_out_time)
        }
    };
    if !plan.is_consistent(allocator.tolerance) {
        log::warn!(
            "Slide plan covers {:.3}s of {:.3}s",
            plan.scheduled_duration(),
            plan.total_duration
        );
    }

    // 2. Transition styles, with the luma map attached when rendering
    let styles = match cli.luma_map {
        Some(ref path) if !cli.plan_only => {
            let map = Arc::new(render::prepare::load_luma_map(path, cli.width, cli.height)?);
            styles
                .into_iter()
                .map(|style| style.with_luma_map(Arc::clone(&map)))
                .collect()
        }
        _ => styles,
    };
    plan.assign_styles(&styles);

    if let Some(ref path) = cli.plan_output {
        plan.write_json(path)?;
    }
    if cli.plan_only {
        if cli.plan_output.is_none() {
            println!("{}", plan.to_json()?);
        }
        return Ok(());
    }

    // 3. Prepare images
    if cli.images.is_empty() {
        anyhow::bail!("No images given");
    }
    log::info!("Preparing {} images...", cli.images.len());
    let frames = render::prepare::prepare_frames(&cli.images, cli.width, cli.height)?;
    let timeline = Timeline::new(plan, frames, cli.fps, cli.seed)?;
    let total_frames = timeline.frame_count();
    log::info!("Total frames: {}", total_frames);

    // 4. Start FFmpeg encoder
    log::info!("Starting FFmpeg encoder...");
    let settings = EncoderSettings {
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
        codec: cli.codec.clone(),
        pix_fmt: cli.pix_fmt.clone(),
        crf: cli.crf,
        bitrate: cli.bitrate.clone(),
    };
    let mut encoder = FfmpegEncoder::new(&cli.output, cli.audio.as_deref(), &settings)?;

    // 5. Render loop
    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let chunk = (rayon::current_num_threads() * 2).max(1) as u64;
    let mut next = 0;
    while next < total_frames {
        let end = (next + chunk).min(total_frames);
        for frame in timeline.render_range(next..end)? {
            encoder.write_frame(&frame.to_rgb_bytes())?;
        }
        next = end;
        pb.set_position(next);
    }

    pb.finish_with_message("Rendering complete");

    // 6. Finish encoding
    log::info!("Finishing encoding...");
    encoder.finish()?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}
