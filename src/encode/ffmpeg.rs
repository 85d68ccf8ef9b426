use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Output stream parameters handed to ffmpeg.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
}

pub struct FfmpegEncoder {
    /// `None` once finished
    child: Option<Child>,
    frame_bytes: usize,
    frames_written: u64,
}

impl FfmpegEncoder {
    /// Spawn ffmpeg reading raw RGB24 frames from stdin. When `audio` is
    /// given it is muxed in and the output stops at the shorter stream.
    pub fn new(output_path: &Path, audio: Option<&Path>, settings: &EncoderSettings) -> Result<Self> {
        let args = build_args(output_path, audio, settings);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width,
            settings.height,
            settings.fps,
            settings.codec
        );

        Ok(Self::from_child(
            child,
            settings.width as usize * settings.height as usize * 3,
        ))
    }

    fn from_child(child: Child, frame_bytes: usize) -> Self {
        Self {
            child: Some(child),
            frame_bytes,
            frames_written: 0,
        }
    }

    pub fn write_frame(&mut self, rgb_pixels: &[u8]) -> Result<()> {
        if rgb_pixels.len() != self.frame_bytes {
            anyhow::bail!(
                "Frame has {} bytes, encoder expects {}",
                rgb_pixels.len(),
                self.frame_bytes
            );
        }
        let stdin = self
            .child
            .as_mut()
            .and_then(|child| child.stdin.as_mut())
            .context("FFmpeg stdin not available")?;
        if let Err(err) = stdin.write_all(rgb_pixels) {
            let stderr = self.collect_stderr();
            return Err(err).with_context(|| {
                format!(
                    "Failed to write frame {} to ffmpeg:\n{}",
                    self.frames_written,
                    stderr.trim_end()
                )
            });
        }
        self.frames_written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        let mut child = self.child.take().context("FFmpeg already finished")?;
        // Close stdin to signal EOF
        drop(child.stdin.take());

        let output = child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete ({} frames)", self.frames_written);
        Ok(())
    }

    /// Reap a failed ffmpeg and return what it printed.
    fn collect_stderr(&mut self) -> String {
        let Some(mut child) = self.child.take() else {
            return String::new();
        };
        drop(child.stdin.take());
        match child.wait_with_output() {
            Ok(output) => String::from_utf8_lossy(&output.stderr).into_owned(),
            Err(err) => format!("(ffmpeg output unavailable: {err})"),
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            log::warn!(
                "Stopping unfinished ffmpeg after {} frames",
                self.frames_written
            );
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn build_args(output_path: &Path, audio: Option<&Path>, settings: &EncoderSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pixel_format",
        "rgb24",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push("-video_size".into());
    args.push(format!("{}x{}", settings.width, settings.height).into());
    args.push("-framerate".into());
    args.push(settings.fps.to_string().into());
    args.push("-i".into());
    args.push("pipe:0".into());

    if let Some(audio) = audio {
        args.push("-i".into());
        args.push(audio.as_os_str().to_owned());
    }

    args.push("-c:v".into());
    args.push(settings.codec.clone().into());
    args.push("-pix_fmt".into());
    args.push(settings.pix_fmt.clone().into());

    if let Some(ref br) = settings.bitrate {
        args.push("-b:v".into());
        args.push(br.into());
    } else {
        args.push("-crf".into());
        args.push(settings.crf.to_string().into());
        args.push("-preset".into());
        args.push("medium".into());
    }

    if audio.is_some() {
        for arg in ["-c:a", "aac", "-b:a", "192k", "-shortest"] {
            args.push(arg.into());
        }
    }

    args.push(output_path.as_os_str().to_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EncoderSettings {
        EncoderSettings {
            width: 1280,
            height: 720,
            fps: 25,
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 20,
            bitrate: None,
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn args_with_audio_track() {
        let args = strings(&build_args(
            Path::new("out.mp4"),
            Some(Path::new("song.mp3")),
            &settings(),
        ));
        assert!(args.windows(2).any(|w| w == ["-pixel_format", "rgb24"]));
        assert!(args.windows(2).any(|w| w == ["-video_size", "1280x720"]));
        assert!(args.windows(2).any(|w| w == ["-i", "song.mp3"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "20"]));
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn failed_write_reports_ffmpeg_stderr() {
        let mut child = Command::new("sh")
            .args(["-c", "echo 'Unknown encoder' >&2; exit 1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        while child.try_wait().unwrap().is_none() {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let mut encoder = FfmpegEncoder::from_child(child, 3);
        let err = encoder.write_frame(&[0, 0, 0]).unwrap_err();
        assert!(err.to_string().contains("Unknown encoder"), "{err:#}");
        assert!(encoder.finish().is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn dropping_unfinished_encoder_stops_ffmpeg() {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::piped())
            .spawn()
            .unwrap();
        let pid = child.id();
        drop(FfmpegEncoder::from_child(child, 3));
        assert!(!Path::new(&format!("/proc/{pid}")).exists());
    }

    #[test]
    fn args_without_audio_skip_audio_codec() {
        let mut s = settings();
        s.bitrate = Some("5M".into());
        let args = strings(&build_args(Path::new("out.mp4"), None, &s));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(args.windows(2).any(|w| w == ["-b:v", "5M"]));
        assert!(!args.contains(&"-crf".to_string()));
    }
}
