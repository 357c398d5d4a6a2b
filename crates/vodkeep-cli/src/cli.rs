//! Command-line client for interacting with a vodkeep server instance.

use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vodkeep_api_models::{
    DiagnosticsResponseDto, ErrorResponseDto, EnqueueResponseDto, JobDto, JobListResponseDto,
    JobResponseDto, ProbeResponseDto,
};

/// Owned mirror of [`vodkeep_api_models::PresetDto`]: the wire type uses
/// `&'static str` fields (cheap to serialize server-side) which can't be
/// deserialized from a response body, so the client parses into this
/// instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClientPresetDto {
    id: String,
    label: String,
    format_selector: String,
    audio_only: bool,
}

const HEADER_REQUEST_ID: &str = "x-request-id";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Clone)]
struct CliDependencies {
    client: Client,
    telemetry: Option<TelemetryEmitter>,
}

impl CliDependencies {
    fn from_env(cli: &Cli, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = reqwest::header::HeaderMap::new();
        let request_id = reqwest::header::HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(Duration::from_secs(cli.timeout))
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            telemetry: TelemetryEmitter::from_env(),
        })
    }
}

/// Parses CLI arguments, executes the requested command, and handles
/// user-facing telemetry emission. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    let deps = match CliDependencies::from_env(&cli, &trace_id) {
        Ok(deps) => deps,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    let telemetry = deps.telemetry.clone();

    let result = dispatch(cli, &deps).await;

    let (exit_code, message, outcome) = match result {
        Ok(()) => (0, None, "success"),
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            eprintln!("error: {message}");
            (exit_code, Some(message), "error")
        }
    };

    if let Some(emitter) = &telemetry {
        emitter
            .emit(
                &trace_id,
                command_name,
                outcome,
                exit_code,
                message.as_deref(),
            )
            .await;
    }

    exit_code
}

async fn dispatch(cli: Cli, deps: &CliDependencies) -> CliResult<()> {
    let ctx = AppContext {
        client: deps.client.clone(),
        base_url: cli.api_url,
    };

    match cli.command {
        Command::Enqueue(args) => handle_enqueue(&ctx, args).await,
        Command::List(args) => handle_list(&ctx, args).await,
        Command::Status(args) => handle_status(&ctx, args).await,
        Command::Pause(args) => handle_pause(&ctx, args).await,
        Command::Resume(args) => handle_resume(&ctx, args).await,
        Command::Retry(args) => handle_retry(&ctx, args).await,
        Command::Delete(args) => handle_delete(&ctx, args).await,
        Command::Presets(args) => handle_presets(&ctx, args).await,
        Command::Probe(args) => handle_probe(&ctx, args).await,
        Command::Diagnostics(args) => handle_diagnostics(&ctx, args).await,
    }
}

#[derive(Parser)]
#[command(name = "vodkeep", about = "Administrative CLI for the vodkeep download service")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "VODKEEP_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    api_url: Url,
    #[arg(
        long,
        global = true,
        env = "VODKEEP_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enqueue a URL for download.
    Enqueue(EnqueueArgs),
    /// List jobs, optionally filtered.
    List(ListArgs),
    /// Show a single job's full state.
    Status(JobIdArgs),
    /// Pause a queued or active job.
    Pause(JobIdArgs),
    /// Resume a paused job.
    Resume(JobIdArgs),
    /// Retry a failed job.
    Retry(JobIdArgs),
    /// Delete a job and its downloaded files.
    Delete(JobIdArgs),
    /// List the available download presets.
    Presets(FormatArgs),
    /// Resolve a URL's metadata without enqueuing a download.
    Probe(ProbeArgs),
    /// Show resolved extractor runtime diagnostics.
    Diagnostics(FormatArgs),
}

#[derive(Args)]
struct EnqueueArgs {
    #[arg(help = "The URL to enqueue")]
    url: String,
    #[arg(long, default_value = "best", help = "Preset id, e.g. best, audio_mp3")]
    preset: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args, Default)]
struct ListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    per_page: Option<u32>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    uploader: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args)]
struct JobIdArgs {
    #[arg(help = "Job identifier")]
    id: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args)]
struct ProbeArgs {
    #[arg(help = "The URL to probe")]
    url: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args, Default)]
struct FormatArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

struct AppContext {
    client: Client,
    base_url: Url,
}

#[derive(Debug)]
enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

struct TelemetryEmitter {
    client: Client,
    endpoint: Url,
}

impl Clone for TelemetryEmitter {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

impl TelemetryEmitter {
    fn from_env() -> Option<Self> {
        let endpoint = env::var("VODKEEP_CLI_TELEMETRY_ENDPOINT").ok()?;
        let endpoint = endpoint.parse().ok()?;
        let client = Client::builder().timeout(Duration::from_secs(2)).build().ok()?;
        Some(Self { client, endpoint })
    }

    async fn emit(
        &self,
        trace_id: &str,
        command: &str,
        outcome: &str,
        exit_code: i32,
        message: Option<&str>,
    ) {
        let event = TelemetryEvent {
            command,
            outcome,
            trace_id,
            exit_code,
            message,
            timestamp_ms: timestamp_now_ms(),
        };

        let _ = self.client.post(self.endpoint.clone()).json(&event).send().await;
    }
}

#[derive(Serialize)]
struct TelemetryEvent<'a> {
    command: &'a str,
    outcome: &'a str,
    trace_id: &'a str,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    timestamp_ms: u64,
}

fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Enqueue(_) => "enqueue",
        Command::List(_) => "list",
        Command::Status(_) => "status",
        Command::Pause(_) => "pause",
        Command::Resume(_) => "resume",
        Command::Retry(_) => "retry",
        Command::Delete(_) => "delete",
        Command::Presets(_) => "presets",
        Command::Probe(_) => "probe",
        Command::Diagnostics(_) => "diagnostics",
    }
}

fn parse_url(input: &str) -> Result<Url, String> {
    input.parse::<Url>().map_err(|err| format!("invalid URL '{input}': {err}"))
}

async fn handle_enqueue(ctx: &AppContext, args: EnqueueArgs) -> CliResult<()> {
    let url = ctx
        .base_url
        .join("/download")
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .post(url)
        .form(&[("u", args.url.as_str()), ("preset", args.preset.as_str())])
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /download failed: {err}")))?;

    if response.status().is_success() {
        let body = response
            .json::<EnqueueResponseDto>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse enqueue response: {err}")))?;
        render_enqueue(&body, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_list(ctx: &AppContext, args: ListArgs) -> CliResult<()> {
    let mut url = ctx
        .base_url
        .join("/api/jobs")
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    {
        let mut pairs = url.query_pairs_mut();
        if let Some(page) = args.page {
            pairs.append_pair("page", &page.to_string());
        }
        if let Some(per_page) = args.per_page {
            pairs.append_pair("per_page", &per_page.to_string());
        }
        if let Some(status) = &args.status {
            pairs.append_pair("status", status);
        }
        if let Some(q) = &args.q {
            pairs.append_pair("q", q);
        }
        if let Some(sort) = &args.sort {
            pairs.append_pair("sort", sort);
        }
        if let Some(uploader) = &args.uploader {
            pairs.append_pair("uploader", uploader);
        }
    }

    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/jobs failed: {err}")))?;

    if response.status().is_success() {
        let page = response
            .json::<JobListResponseDto>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse job list: {err}")))?;
        render_job_list(&page, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_status(ctx: &AppContext, args: JobIdArgs) -> CliResult<()> {
    let url = ctx
        .base_url
        .join(&format!("/api/status/{}", args.id))
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/status/{{id}} failed: {err}")))?;

    if response.status().is_success() {
        let body = response
            .json::<JobResponseDto>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse job response: {err}")))?;
        render_job_detail(&body.job, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_pause(ctx: &AppContext, args: JobIdArgs) -> CliResult<()> {
    handle_job_action(ctx, &args, "pause").await
}

async fn handle_resume(ctx: &AppContext, args: JobIdArgs) -> CliResult<()> {
    handle_job_action(ctx, &args, "resume").await
}

async fn handle_retry(ctx: &AppContext, args: JobIdArgs) -> CliResult<()> {
    handle_job_action(ctx, &args, "retry").await
}

async fn handle_job_action(ctx: &AppContext, args: &JobIdArgs, action: &str) -> CliResult<()> {
    let url = ctx
        .base_url
        .join(&format!("/api/jobs/{}/{action}", args.id))
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .post(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/jobs/{{id}}/{action} failed: {err}")))?;

    if response.status().is_success() {
        let body = response
            .json::<JobResponseDto>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse job response: {err}")))?;
        render_job_detail(&body.job, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_delete(ctx: &AppContext, args: JobIdArgs) -> CliResult<()> {
    let url = ctx
        .base_url
        .join(&format!("/api/jobs/{}", args.id))
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .delete(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/jobs/{{id}} failed: {err}")))?;

    if response.status().is_success() {
        println!("deleted job {}", args.id);
        Ok(())
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_presets(ctx: &AppContext, args: FormatArgs) -> CliResult<()> {
    let url = ctx
        .base_url
        .join("/api/presets")
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/presets failed: {err}")))?;

    if response.status().is_success() {
        let presets = response
            .json::<Vec<ClientPresetDto>>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse presets: {err}")))?;
        render_presets(&presets, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_probe(ctx: &AppContext, args: ProbeArgs) -> CliResult<()> {
    let mut url = ctx
        .base_url
        .join("/api/probe")
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;
    url.query_pairs_mut().append_pair("u", &args.url);

    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/probe failed: {err}")))?;

    if response.status().is_success() {
        let body = response
            .json::<ProbeResponseDto>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse probe response: {err}")))?;
        render_probe(&body, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

async fn handle_diagnostics(ctx: &AppContext, args: FormatArgs) -> CliResult<()> {
    let url = ctx
        .base_url
        .join("/api/diagnostics")
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/diagnostics failed: {err}")))?;

    if response.status().is_success() {
        let body = response
            .json::<DiagnosticsResponseDto>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse diagnostics: {err}")))?;
        render_diagnostics(&body, args.format)
    } else {
        Err(classify_error(response).await)
    }
}

fn render_enqueue(body: &EnqueueResponseDto, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(body),
        OutputFormat::Table => {
            println!("job_id: {}", body.job_id);
            println!("preset: {}", body.preset.id());
            println!("status: {:?}", body.status);
            Ok(())
        }
    }
}

fn render_job_list(page: &JobListResponseDto, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(page),
        OutputFormat::Table => {
            println!("{:<36} {:<12} {:<10} {:>6} TITLE", "ID", "STATUS", "PRESET", "PROG");
            for job in &page.jobs {
                let progress = job.progress_percent.map_or_else(|| "-".to_string(), |p| format!("{p:.1}%"));
                let title = job.title.as_deref().unwrap_or("<untitled>");
                println!(
                    "{:<36} {:<12} {:<10} {:>6} {}",
                    job.id,
                    status_to_str(job.status),
                    job.preset.id(),
                    progress,
                    title
                );
            }
            println!(
                "page {} of {} ({} total)",
                page.page,
                page.total.div_ceil(i64::from(page.per_page)).max(1),
                page.total
            );
            Ok(())
        }
    }
}

fn render_job_detail(job: &JobDto, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(job),
        OutputFormat::Table => {
            println!("id: {}", job.id);
            if let Some(title) = &job.title {
                println!("title: {title}");
            }
            println!("status: {}", status_to_str(job.status));
            println!("preset: {}", job.preset.id());
            println!("url: {}", job.requested_url);
            if let Some(percent) = job.progress_percent {
                println!(
                    "progress: {:.1}% ({}/{})",
                    percent,
                    format_bytes(job.downloaded_bytes),
                    job.total_bytes.map_or_else(|| "?".to_string(), format_bytes)
                );
            }
            println!("attempt: {}/{}", job.attempt_current, job.attempt_max);
            if let Some(message) = &job.error_message {
                println!("error: {message}");
            }
            Ok(())
        }
    }
}

fn render_presets(presets: &[ClientPresetDto], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(presets),
        OutputFormat::Table => {
            println!("{:<14} {:<8} FORMAT SELECTOR", "ID", "AUDIO");
            for preset in presets {
                println!("{:<14} {:<8} {}", preset.id, preset.audio_only, preset.format_selector);
            }
            Ok(())
        }
    }
}

fn render_probe(body: &ProbeResponseDto, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(body),
        OutputFormat::Table => {
            println!("title: {}", body.title.as_deref().unwrap_or("<unknown>"));
            println!("ext: {}", body.ext.as_deref().unwrap_or("?"));
            println!("uploader: {}", body.uploader.as_deref().unwrap_or("?"));
            if let Some(duration) = body.duration_seconds {
                println!("duration: {duration:.0}s");
            }
            Ok(())
        }
    }
}

fn render_diagnostics(body: &DiagnosticsResponseDto, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(body),
        OutputFormat::Table => {
            println!("js_runtime: {}", body.js_runtime);
            println!("js_runtime_path: {}", body.js_runtime_path);
            println!("ffmpeg_path: {}", body.ffmpeg_path.as_deref().unwrap_or("<unset>"));
            println!("youtube_fallback_enabled: {}", body.youtube_fallback_enabled);
            println!("max_concurrent_downloads: {}", body.max_concurrent_downloads);
            Ok(())
        }
    }
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn status_to_str(status: vodkeep_domain::JobStatus) -> &'static str {
    use vodkeep_domain::JobStatus;
    match status {
        JobStatus::Queued => "queued",
        JobStatus::Downloading => "downloading",
        JobStatus::Retrying => "retrying",
        JobStatus::Paused => "paused",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: i64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let value = bytes as f64;
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{value:.0} B")
    }
}

async fn classify_error(response: reqwest::Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&bytes).to_string();
    let error = serde_json::from_slice::<ErrorResponseDto>(&bytes).ok();

    let message = error
        .as_ref()
        .map_or_else(|| body_text.trim().to_string(), |e| e.error.clone());

    if status.is_client_error() {
        CliError::validation(message)
    } else {
        CliError::failure(anyhow!("{message} (status {status})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn context_for(server: &MockServer) -> AppContext {
        AppContext {
            client: Client::new(),
            base_url: server.base_url().parse().expect("valid URL"),
        }
    }

    #[tokio::test]
    async fn enqueue_issues_post_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/download")
                .x_www_form_urlencoded_tuple("u", "https://example.com/watch?v=abc")
                .x_www_form_urlencoded_tuple("preset", "best");
            then.status(202).json_body(json!({
                "ok": true,
                "job_id": "11111111-1111-4111-8111-111111111111",
                "preset": "best",
                "status": "queued"
            }));
        });

        let ctx = context_for(&server);
        let args = EnqueueArgs {
            url: "https://example.com/watch?v=abc".to_string(),
            preset: "best".to_string(),
            format: OutputFormat::Json,
        };

        handle_enqueue(&ctx, args).await.expect("enqueue should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn delete_issues_delete_request() {
        let server = MockServer::start_async().await;
        let id = "11111111-1111-4111-8111-111111111111";
        let mock = server.mock(|when, then| {
            when.method(DELETE).path(format!("/api/jobs/{id}"));
            then.status(200).json_body(json!({
                "ok": true,
                "job": sample_job_json(id)
            }));
        });

        let ctx = context_for(&server);
        let args = JobIdArgs {
            id: id.to_string(),
            format: OutputFormat::Table,
        };

        handle_delete(&ctx, args).await.expect("delete should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn status_surfaces_a_404_as_a_validation_error() {
        let server = MockServer::start_async().await;
        let id = "22222222-2222-4222-8222-222222222222";
        server.mock(|when, then| {
            when.method(GET).path(format!("/api/status/{id}"));
            then.status(404).json_body(json!({"ok": false, "error": "not_found"}));
        });

        let ctx = context_for(&server);
        let args = JobIdArgs {
            id: id.to_string(),
            format: OutputFormat::Table,
        };

        let err = handle_status(&ctx, args).await.expect_err("404 should fail");
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("not_found"));
    }

    #[tokio::test]
    async fn retry_on_a_500_is_a_failure_not_a_validation_error() {
        let server = MockServer::start_async().await;
        let id = "33333333-3333-4333-8333-333333333333";
        server.mock(|when, then| {
            when.method(POST).path(format!("/api/jobs/{id}/retry"));
            then.status(500).json_body(json!({"ok": false, "error": "internal_error"}));
        });

        let ctx = context_for(&server);
        let args = JobIdArgs {
            id: id.to_string(),
            format: OutputFormat::Table,
        };

        let err = handle_retry(&ctx, args).await.expect_err("500 should fail");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn format_bytes_displays_expected_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn status_to_str_maps_variants() {
        assert_eq!(status_to_str(vodkeep_domain::JobStatus::Queued), "queued");
        assert_eq!(status_to_str(vodkeep_domain::JobStatus::Completed), "completed");
    }

    #[test]
    fn command_label_matches_variants() {
        assert_eq!(
            command_label(&Command::Enqueue(EnqueueArgs {
                url: "https://example.com".to_string(),
                preset: "best".to_string(),
                format: OutputFormat::Table,
            })),
            "enqueue"
        );
        assert_eq!(
            command_label(&Command::Retry(JobIdArgs {
                id: "x".to_string(),
                format: OutputFormat::Table,
            })),
            "retry"
        );
    }

    fn sample_job_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "requested_url": "https://example.com/watch?v=abc",
            "preset": "best",
            "created_at": "2026-01-01T00:00:00Z",
            "canonical_url": null,
            "webpage_url": null,
            "video_id": null,
            "extractor": null,
            "extractor_key": null,
            "title": "Example video",
            "uploader": null,
            "uploader_id": null,
            "channel": null,
            "channel_id": null,
            "duration_seconds": null,
            "upload_date": null,
            "thumbnail_remote_url": null,
            "media_local_path": null,
            "media_ext": null,
            "thumbnail_local_path": null,
            "status": "completed",
            "queued_at": null,
            "started_at": null,
            "paused_at": null,
            "completed_at": null,
            "failed_at": null,
            "updated_at": "2026-01-01T00:00:00Z",
            "progress_percent": 100.0,
            "downloaded_bytes": 1024,
            "total_bytes": 1024,
            "speed_bps": null,
            "eta_seconds": null,
            "attempt_current": 1,
            "attempt_max": 3,
            "runtime_profile": "default",
            "last_exception_type": null,
            "error_message": null,
            "metadata_json": null
        })
    }
}
