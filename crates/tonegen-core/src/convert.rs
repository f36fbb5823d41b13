//! Format conversion through an external transcoder.
//!
//! This module owns no audio logic. It builds the transcoder invocation,
//! checks that the binary exists and interprets the exit status. Converted
//! files are written to a temporary sibling and renamed into place only when
//! the transcoder succeeds.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::str::FromStr;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ToneError, ToneResult};

/// Default timeout for one transcoder run (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// How long to wait for the transcoder's stderr to close after it exits.
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// Environment variable that overrides the ffmpeg location.
pub const FFMPEG_ENV: &str = "TONEGEN_FFMPEG";

/// Output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Uncompressed 16-bit PCM WAV, written in-process.
    Wav,
    /// FLAC at compression level 8.
    Flac,
    /// Opus at 128 kbit/s.
    Opus,
    /// MP3 at 320 kbit/s.
    Mp3,
}

/// Coarse classification of an [`OutputFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Uncompressed PCM container.
    LosslessContainer,
    /// Lossless compression.
    LosslessCompressed,
    /// Lossy at a low bitrate.
    LossyLowBitrate,
    /// Lossy at a high bitrate.
    LossyHighBitrate,
}

impl OutputFormat {
    /// All formats in canonical order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Wav,
        OutputFormat::Flac,
        OutputFormat::Opus,
        OutputFormat::Mp3,
    ];

    /// Format identifier, also used as the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
            OutputFormat::Opus => "opus",
            OutputFormat::Mp3 => "mp3",
        }
    }

    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Coarse classification of this format.
    pub fn kind(&self) -> FormatKind {
        match self {
            OutputFormat::Wav => FormatKind::LosslessContainer,
            OutputFormat::Flac => FormatKind::LosslessCompressed,
            OutputFormat::Opus => FormatKind::LossyLowBitrate,
            OutputFormat::Mp3 => FormatKind::LossyHighBitrate,
        }
    }

    /// Whether producing this format needs the external transcoder.
    pub fn needs_transcoder(&self) -> bool {
        !matches!(self, OutputFormat::Wav)
    }

    /// Format-specific transcoder arguments.
    fn codec_args(&self) -> &'static [&'static str] {
        match self {
            OutputFormat::Wav => &[],
            OutputFormat::Flac => &["-compression_level", "8"],
            OutputFormat::Opus => &["-c:a", "libopus", "-b:a", "128k"],
            OutputFormat::Mp3 => &["-codec:a", "libmp3lame", "-b:a", "320k"],
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "flac" => Ok(OutputFormat::Flac),
            "opus" => Ok(OutputFormat::Opus),
            "mp3" => Ok(OutputFormat::Mp3),
            other => Err(format!(
                "unknown format '{}' (expected one of: wav, flac, opus, mp3)",
                other
            )),
        }
    }
}

/// An external program that converts a WAV file into another container.
pub trait Transcoder {
    /// Human-readable name for logs and summaries.
    fn name(&self) -> &str;

    /// Converts `input` into `output` as `format`.
    ///
    /// `output` may already exist and must be overwritten.
    fn transcode(&self, input: &Path, output: &Path, format: OutputFormat) -> ToneResult<()>;
}

impl<T: Transcoder + ?Sized> Transcoder for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn transcode(&self, input: &Path, output: &Path, format: OutputFormat) -> ToneResult<()> {
        (**self).transcode(input, output, format)
    }
}

/// Configuration for locating and running ffmpeg.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Explicit ffmpeg executable.
    pub ffmpeg_path: Option<PathBuf>,
    /// Timeout for a single conversion.
    pub timeout: Duration,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ConverterConfig {
    /// Sets the ffmpeg executable path.
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// ffmpeg-backed [`Transcoder`].
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    path: PathBuf,
    timeout: Duration,
}

impl Ffmpeg {
    /// Locates ffmpeg: configured path, then `TONEGEN_FFMPEG`, then `PATH`.
    ///
    /// # Errors
    /// [`ToneError::EncoderUnavailable`] if no executable is found.
    pub fn locate(config: &ConverterConfig) -> ToneResult<Self> {
        let path = find_ffmpeg(config)?;
        debug!(path = %path.display(), "located ffmpeg");
        Ok(Self {
            path,
            timeout: config.timeout,
        })
    }

    /// Path of the ffmpeg executable.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `ffmpeg -version` and returns the first line of its output.
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
    }
}

fn find_ffmpeg(config: &ConverterConfig) -> ToneResult<PathBuf> {
    // Check config override first
    if let Some(ref path) = config.ffmpeg_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return which::which(path).map_err(|_| {
            ToneError::encoder_unavailable(format!(
                "configured ffmpeg not found: {}",
                path.display()
            ))
        });
    }

    if let Some(path) = std::env::var_os(FFMPEG_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ToneError::encoder_unavailable(format!(
            "{} points to a missing file: {}",
            FFMPEG_ENV,
            path.display()
        )));
    }

    which::which("ffmpeg").map_err(|_| {
        ToneError::encoder_unavailable(format!(
            "ffmpeg not found in PATH; install it or set {}",
            FFMPEG_ENV
        ))
    })
}

/// Builds the ffmpeg argument list for one conversion.
pub fn ffmpeg_args(input: &Path, output: &Path, format: OutputFormat) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());
    args.extend(format.codec_args().iter().map(OsString::from));
    args.push(output.as_os_str().to_owned());
    args
}

impl Transcoder for Ffmpeg {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn transcode(&self, input: &Path, output: &Path, format: OutputFormat) -> ToneResult<()> {
        let mut cmd = Command::new(&self.path);
        cmd.args(ffmpeg_args(input, output, format))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToneError::encoder_unavailable(format!(
                    "{} disappeared: {}",
                    self.path.display(),
                    e
                ))
            } else {
                ToneError::conversion_failed(format.as_str(), format!("spawn failed: {}", e), "")
            }
        })?;

        let (status, stderr) = wait_with_timeout(child, self.timeout, format)?;
        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(ToneError::conversion_failed(
                format.as_str(),
                format!("ffmpeg exited with status {}", code),
                stderr,
            ));
        }
        Ok(())
    }
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    format: OutputFormat,
) -> ToneResult<(ExitStatus, String)> {
    // Drain stderr on a helper thread while polling. The thread is never
    // joined: a grandchild may keep the pipe open after the child exits.
    let stderr_rx = child.stderr.take().map(|mut err| {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = err.read_to_string(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    });
    let collect_stderr = |rx: Option<mpsc::Receiver<String>>| {
        rx.and_then(|rx| rx.recv_timeout(STDERR_GRACE).ok())
            .unwrap_or_default()
    };

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToneError::conversion_failed(
                        format.as_str(),
                        format!("timed out after {} seconds", timeout.as_secs()),
                        collect_stderr(stderr_rx),
                    ));
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(ToneError::conversion_failed(
                    format.as_str(),
                    format!("failed to wait for transcoder: {}", e),
                    "",
                ));
            }
        }
    };

    Ok((status, collect_stderr(stderr_rx)))
}

/// Path of the converted sibling of `lossless` for `format`.
pub fn sibling_path(lossless: &Path, format: OutputFormat) -> PathBuf {
    lossless.with_extension(format.extension())
}

/// Converts the lossless file at `lossless` into `format`, next to it.
///
/// The transcoder writes to a temporary file in the same directory, which
/// replaces the final path only on success; a failed run leaves any previous
/// output untouched.
///
/// # Returns
/// The path of the converted file.
pub fn convert(
    transcoder: &dyn Transcoder,
    lossless: &Path,
    format: OutputFormat,
) -> ToneResult<PathBuf> {
    if !format.needs_transcoder() {
        return Err(ToneError::conversion_failed(
            format.as_str(),
            "the lossless container is written directly, not converted",
            "",
        ));
    }

    let target = sibling_path(lossless, format);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // The extension tells the transcoder which muxer to use.
    let tmp = tempfile::Builder::new()
        .prefix(".tonegen-")
        .suffix(&format!(".part.{}", format.extension()))
        .tempfile_in(dir)
        .map_err(|e| ToneError::io_write(&target, e))?
        .into_temp_path();

    debug!(
        transcoder = transcoder.name(),
        input = %lossless.display(),
        output = %target.display(),
        format = %format,
        "converting"
    );
    transcoder.transcode(lossless, &tmp, format)?;

    tmp.persist(&target)
        .map_err(|e| ToneError::io_write(&target, e.error))?;
    info!(path = %target.display(), "converted");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_format_identifiers() {
        for format in OutputFormat::ALL {
            assert_eq!(format.as_str().parse::<OutputFormat>().unwrap(), format);
            assert_eq!(format.extension(), format.to_string());
        }
        assert_eq!("FLAC".parse::<OutputFormat>().unwrap(), OutputFormat::Flac);
        assert!("ogg".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_kinds() {
        assert_eq!(OutputFormat::Wav.kind(), FormatKind::LosslessContainer);
        assert_eq!(OutputFormat::Flac.kind(), FormatKind::LosslessCompressed);
        assert_eq!(OutputFormat::Opus.kind(), FormatKind::LossyLowBitrate);
        assert_eq!(OutputFormat::Mp3.kind(), FormatKind::LossyHighBitrate);
        assert!(!OutputFormat::Wav.needs_transcoder());
        assert!(OutputFormat::Mp3.needs_transcoder());
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&vec![OutputFormat::Wav, OutputFormat::Mp3]).unwrap();
        assert_eq!(json, r#"["wav","mp3"]"#);
        let parsed: Vec<OutputFormat> = serde_json::from_str(r#"["opus","flac"]"#).unwrap();
        assert_eq!(parsed, vec![OutputFormat::Opus, OutputFormat::Flac]);
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = ffmpeg_args(Path::new("in.wav"), Path::new("out.mp3"), OutputFormat::Mp3);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i", "in.wav",
                "-codec:a", "libmp3lame", "-b:a", "320k", "out.mp3"
            ]
        );

        let flac = ffmpeg_args(Path::new("a.wav"), Path::new("a.flac"), OutputFormat::Flac);
        assert!(flac.iter().any(|a| a == "-compression_level"));
        let opus = ffmpeg_args(Path::new("a.wav"), Path::new("a.opus"), OutputFormat::Opus);
        assert!(opus.iter().any(|a| a == "libopus"));
        assert!(opus.iter().any(|a| a == "128k"));
    }

    #[test]
    fn test_sibling_path() {
        let wav = Path::new("out/440.123Hz.wav");
        assert_eq!(
            sibling_path(wav, OutputFormat::Flac),
            PathBuf::from("out/440.123Hz.flac")
        );
    }

    #[test]
    fn test_config_builder() {
        let config = ConverterConfig::default()
            .ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
            .timeout_secs(12);
        assert_eq!(
            config.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_locate_missing_configured_binary() {
        let config = ConverterConfig::default().ffmpeg_path("/definitely/not/here/ffmpeg");
        let err = Ffmpeg::locate(&config).unwrap_err();
        assert!(matches!(err, ToneError::EncoderUnavailable { .. }));
    }

    struct Recording {
        calls: RefCell<Vec<(PathBuf, PathBuf, OutputFormat)>>,
        fail: bool,
    }

    impl Transcoder for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn transcode(&self, input: &Path, output: &Path, format: OutputFormat) -> ToneResult<()> {
            self.calls
                .borrow_mut()
                .push((input.to_path_buf(), output.to_path_buf(), format));
            if self.fail {
                std::fs::write(output, b"half written").unwrap();
                return Err(ToneError::conversion_failed(format.as_str(), "boom", "stderr"));
            }
            std::fs::write(output, format.as_str()).unwrap();
            Ok(())
        }
    }

    #[test]
    fn test_convert_writes_sibling_via_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("440Hz.wav");
        std::fs::write(&wav, b"RIFF").unwrap();

        let transcoder = Recording {
            calls: RefCell::new(Vec::new()),
            fail: false,
        };
        let out = convert(&transcoder, &wav, OutputFormat::Opus).unwrap();

        assert_eq!(out, dir.path().join("440Hz.opus"));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "opus");
        let calls = transcoder.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, wav);
        assert_ne!(calls[0].1, out);
        assert!(calls[0].1.to_string_lossy().ends_with(".opus"));
        assert!(!calls[0].1.exists());
    }

    #[test]
    fn test_convert_failure_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("440Hz.wav");
        std::fs::write(&wav, b"RIFF").unwrap();
        let previous = dir.path().join("440Hz.mp3");
        std::fs::write(&previous, b"previous run").unwrap();

        let transcoder = Recording {
            calls: RefCell::new(Vec::new()),
            fail: true,
        };
        let err = convert(&transcoder, &wav, OutputFormat::Mp3).unwrap_err();

        assert!(matches!(err, ToneError::ConversionFailed { .. }));
        assert_eq!(std::fs::read(&previous).unwrap(), b"previous run");
        // Only the lossless input and the previous output remain.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_convert_rejects_wav_target() {
        let transcoder = Recording {
            calls: RefCell::new(Vec::new()),
            fail: false,
        };
        let err = convert(&transcoder, Path::new("a.wav"), OutputFormat::Wav).unwrap_err();
        assert!(matches!(err, ToneError::ConversionFailed { .. }));
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_success_copies_to_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        // Copies the -i input to the final argument.
        let fake = script(
            dir.path(),
            "fake-ffmpeg",
            r#"while [ "$#" -gt 0 ]; do
  if [ "$1" = "-i" ]; then shift; in="$1"; fi
  last="$1"; shift
done
cp "$in" "$last""#,
        );
        let wav = dir.path().join("t.wav");
        std::fs::write(&wav, b"payload").unwrap();

        let ffmpeg = Ffmpeg::locate(&ConverterConfig::default().ffmpeg_path(&fake)).unwrap();
        let out = convert(&ffmpeg, &wav, OutputFormat::Flac).unwrap();
        assert_eq!(std::fs::read(out).unwrap(), b"payload");
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_nonzero_exit_is_conversion_failed() {
        let dir = tempfile::tempdir().unwrap();
        let fake = script(dir.path(), "fake-ffmpeg", "echo 'Unknown encoder' 1>&2\nexit 3");
        let wav = dir.path().join("t.wav");
        std::fs::write(&wav, b"payload").unwrap();

        let ffmpeg = Ffmpeg::locate(&ConverterConfig::default().ffmpeg_path(&fake)).unwrap();
        let err = convert(&ffmpeg, &wav, OutputFormat::Opus).unwrap_err();
        match err {
            ToneError::ConversionFailed {
                format,
                message,
                output,
            } => {
                assert_eq!(format, "opus");
                assert!(message.contains('3'));
                assert!(output.contains("Unknown encoder"));
            }
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
        assert!(!dir.path().join("t.opus").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let fake = script(dir.path(), "slow-ffmpeg", "exec sleep 5");
        let wav = dir.path().join("t.wav");
        std::fs::write(&wav, b"payload").unwrap();

        let config = ConverterConfig {
            ffmpeg_path: Some(fake),
            timeout: Duration::from_millis(100),
        };
        let ffmpeg = Ffmpeg::locate(&config).unwrap();
        let err = convert(&ffmpeg, &wav, OutputFormat::Mp3).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_timeout_with_lingering_grandchild() {
        let dir = tempfile::tempdir().unwrap();
        let fake = script(dir.path(), "forking-ffmpeg", "sleep 5 &\nexec sleep 5");
        let wav = dir.path().join("t.wav");
        std::fs::write(&wav, b"payload").unwrap();

        let config = ConverterConfig {
            ffmpeg_path: Some(fake),
            timeout: Duration::from_millis(100),
        };
        let ffmpeg = Ffmpeg::locate(&config).unwrap();
        let start = Instant::now();
        let err = convert(&ffmpeg, &wav, OutputFormat::Flac).unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(3), "{:?}", start.elapsed());
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_version_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let fake = script(dir.path(), "fake-ffmpeg", "echo 'ffmpeg version 6.1 Copyright'\necho more");
        let ffmpeg = Ffmpeg::locate(&ConverterConfig::default().ffmpeg_path(&fake)).unwrap();
        assert_eq!(ffmpeg.version().as_deref(), Some("ffmpeg version 6.1 Copyright"));
    }
}
