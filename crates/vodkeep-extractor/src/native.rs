//! Process-based extractor adapter: shells out to an external extraction
//! engine binary and speaks a small newline-delimited JSON protocol on its
//! stdout (spec §4.6 treats the engine as an opaque dependency; this is
//! the boundary where that dependency is actually invoked).
//!
//! Each stdout line is one JSON object tagged by `type`:
//! - `{"type":"progress", ...}` — deserialises directly into
//!   [`ProgressEvent`], forwarded to the caller's hook.
//! - `{"type":"result", "info": { ... }}` — the final info dict.
//! - `{"type":"error", "message": "...", "exception_type": "..."}` — a
//!   structured failure; anything else on a nonzero exit is wrapped from
//!   the process's stderr tail instead.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::adapter::{ExtractorAdapter, ProgressHook};
use crate::error::ExtractorError;
use crate::types::{ExtractOptions, InfoDict, ProbeInfo, ProgressEvent};

const STDERR_TAIL_LINES: usize = 20;

/// Shells out to `binary_path` once per [`ExtractorAdapter::extract`] or
/// [`ExtractorAdapter::probe`] call.
#[derive(Debug, Clone)]
pub struct NativeExtractor {
    binary_path: PathBuf,
}

impl NativeExtractor {
    /// Construct an adapter that invokes `binary_path` as a child process.
    #[must_use]
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn command_for(&self, url: &str, options: &ExtractOptions, probe_only: bool) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("--url")
            .arg(url)
            .arg("--format")
            .arg(&options.format)
            .arg("--outtmpl")
            .arg(&options.outtmpl)
            .arg("--retries")
            .arg(options.retries.to_string())
            .arg("--concurrent-fragments")
            .arg(options.concurrent_fragment_downloads.to_string())
            .arg("--js-runtime")
            .arg(&options.js_runtime)
            .arg("--js-runtime-path")
            .arg(&options.js_runtime_path);

        if options.restrictfilenames {
            command.arg("--restrict-filenames");
        }
        if options.writethumbnail {
            command.arg("--write-thumbnail");
        }
        if options.writeinfojson {
            command.arg("--write-info-json");
        }
        if let Some(format) = &options.merge_output_format {
            command.arg("--merge-output-format").arg(format);
        }
        if let Some(format) = &options.audio_format {
            command.arg("--extract-audio").arg("--audio-format").arg(format);
        }
        if let Some(ffmpeg) = &options.ffmpeg_location {
            command.arg("--ffmpeg-location").arg(ffmpeg);
        }
        if let Some(clients) = &options.extractor_args_youtube_player_client {
            command.arg("--youtube-player-clients").arg(clients.join(","));
        }
        if probe_only {
            command.arg("--skip-download");
        }

        command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        command
    }

    async fn run(
        &self,
        mut command: Command,
        hook: Option<ProgressHook>,
    ) -> Result<InfoDict, ExtractorError> {
        let mut child = command.spawn().map_err(ExtractorError::Process)?;
        let stdout = child.stdout.take().expect("stdout was piped");
        let mut lines = BufReader::new(stdout).lines();

        let mut result: Option<InfoDict> = None;
        loop {
            let line = lines.next_line().await.map_err(ExtractorError::Process)?;
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Envelope>(&line) {
                Ok(Envelope::Progress(event)) => {
                    if let Some(hook) = &hook {
                        if let Err(err) = hook(event).await {
                            let _ = child.start_kill();
                            let _ = child.wait().await;
                            return Err(err);
                        }
                    }
                }
                Ok(Envelope::Result { info }) => result = Some(info),
                Ok(Envelope::Error { message, exception_type }) => {
                    let _ = child.wait().await;
                    return Err(ExtractorError::Failed { message, exception_type });
                }
                Err(err) => {
                    tracing::debug!(line = %line, error = %err, "ignoring unparseable extractor output line");
                }
            }
        }

        let status = child.wait().await.map_err(ExtractorError::Process)?;
        if !status.success() && result.is_none() {
            return Err(ExtractorError::failed(tail_of_stderr(&mut child).await));
        }

        result.ok_or_else(|| {
            ExtractorError::Protocol("extractor exited without a result line".to_string())
        })
    }
}

async fn tail_of_stderr(child: &mut Child) -> String {
    let Some(stderr) = child.stderr.take() else {
        return "extractor process exited with a non-zero status".to_string();
    };
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        tail.push(line);
        if tail.len() > STDERR_TAIL_LINES {
            tail.remove(0);
        }
    }
    if tail.is_empty() {
        "extractor process exited with a non-zero status".to_string()
    } else {
        tail.join("\n")
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    Progress(ProgressEvent),
    Result {
        info: InfoDict,
    },
    Error {
        message: String,
        exception_type: String,
    },
}

#[async_trait]
impl ExtractorAdapter for NativeExtractor {
    async fn extract(
        &self,
        url: &str,
        options: &ExtractOptions,
        hook: ProgressHook,
    ) -> Result<InfoDict, ExtractorError> {
        let command = self.command_for(url, options, false);
        self.run(command, Some(hook)).await
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, ExtractorError> {
        let options = ExtractOptions {
            outtmpl: "%(title).200B [%(id)s].%(ext)s".to_string(),
            restrictfilenames: true,
            format: "bestvideo+bestaudio/best".to_string(),
            merge_output_format: None,
            audio_format: None,
            writethumbnail: false,
            writeinfojson: false,
            retries: ExtractOptions::MIN_RETRIES,
            concurrent_fragment_downloads: ExtractOptions::CONCURRENT_FRAGMENT_DOWNLOADS,
            js_runtime: "node".to_string(),
            js_runtime_path: PathBuf::from("/usr/bin/node"),
            ffmpeg_location: None,
            extractor_args_youtube_player_client: None,
        };
        let command = self.command_for(url, &options, true);
        let info = self.run(command, None).await?;
        Ok(ProbeInfo {
            title: info.title,
            ext: info
                .requested_downloads
                .first()
                .and_then(|d| d.candidate())
                .and_then(|path| std::path::Path::new(path).extension())
                .and_then(|ext| ext.to_str())
                .map(str::to_string),
            video_id: info.id,
            uploader: info.uploader,
            duration_seconds: info.duration,
            thumbnail_remote_url: info.thumbnail,
        })
    }
}
