//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "torchio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3013;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_OUTPUT_BASE_URL: &str = "http://127.0.0.1:3013";
const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:3023/";
const DEFAULT_ENGINE_REQUEST_TIMEOUT_SECS: u64 = 90;

/// Command-line arguments for the Torchio binary.
#[derive(Debug, Parser)]
#[command(name = "torchio", version, about = "Torchio compile service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TORCHIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Torchio HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the maximum duration of one compile attempt.
    #[arg(long = "compile-timeout-seconds", value_name = "SECONDS")]
    pub compile_timeout_seconds: Option<u64>,

    /// Override the base URL under which output artifacts are addressed.
    #[arg(long = "compile-output-base-url", value_name = "URL")]
    pub compile_output_base_url: Option<String>,

    /// Override the zone prefix echoed back in compile responses.
    #[arg(long = "compile-output-url-prefix", value_name = "PREFIX")]
    pub compile_output_url_prefix: Option<String>,

    /// Override the remote engine endpoint.
    #[arg(long = "engine-url", value_name = "URL")]
    pub engine_url: Option<String>,

    /// Override the engine HTTP client timeout.
    #[arg(long = "engine-request-timeout-seconds", value_name = "SECONDS")]
    pub engine_request_timeout_seconds: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub compile: CompileSettings,
    pub engine: EngineSettings,
    pub images: ImageSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CompileSettings {
    pub timeout: Duration,
    pub output_base_url: String,
    pub output_url_prefix: String,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    /// Sandbox images requests may name. Empty disables the gate.
    pub allowed: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TORCHIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    compile: RawCompileSettings,
    engine: RawEngineSettings,
    images: RawImageSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCompileSettings {
    timeout_seconds: Option<u64>,
    output_base_url: Option<String>,
    output_url_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEngineSettings {
    url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImageSettings {
    allowed: Vec<String>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(seconds) = overrides.compile_timeout_seconds {
            self.compile.timeout_seconds = Some(seconds);
        }
        if let Some(url) = overrides.compile_output_base_url.as_ref() {
            self.compile.output_base_url = Some(url.clone());
        }
        if let Some(prefix) = overrides.compile_output_url_prefix.as_ref() {
            self.compile.output_url_prefix = Some(prefix.clone());
        }
        if let Some(url) = overrides.engine_url.as_ref() {
            self.engine.url = Some(url.clone());
        }
        if let Some(seconds) = overrides.engine_request_timeout_seconds {
            self.engine.request_timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            compile,
            engine,
            images,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let compile = build_compile_settings(compile)?;
        let engine = build_engine_settings(engine)?;
        let images = ImageSettings {
            allowed: images.allowed,
        };

        Ok(Self {
            server,
            logging,
            compile,
            engine,
            images,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let listen_addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.listen_addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        listen_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_compile_settings(compile: RawCompileSettings) -> Result<CompileSettings, LoadError> {
    let timeout_secs = compile
        .timeout_seconds
        .unwrap_or(DEFAULT_COMPILE_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "compile.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let output_base_url = compile
        .output_base_url
        .unwrap_or_else(|| DEFAULT_OUTPUT_BASE_URL.to_string());
    Url::parse(&output_base_url).map_err(|err| {
        LoadError::invalid("compile.output_base_url", format!("failed to parse: {err}"))
    })?;
    let output_base_url = output_base_url.trim_end_matches('/').to_string();

    Ok(CompileSettings {
        timeout: Duration::from_secs(timeout_secs),
        output_base_url,
        output_url_prefix: compile.output_url_prefix.unwrap_or_default(),
    })
}

fn build_engine_settings(engine: RawEngineSettings) -> Result<EngineSettings, LoadError> {
    let raw_url = engine.url.unwrap_or_else(|| DEFAULT_ENGINE_URL.to_string());
    let mut url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("engine.url", format!("failed to parse: {err}")))?;
    // Url::join replaces the last segment unless the base path ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    let request_timeout_secs = engine
        .request_timeout_seconds
        .unwrap_or(DEFAULT_ENGINE_REQUEST_TIMEOUT_SECS);
    if request_timeout_secs == 0 {
        return Err(LoadError::invalid(
            "engine.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(EngineSettings {
        url,
        request_timeout: Duration::from_secs(request_timeout_secs),
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.listen_addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn compile_timeout_defaults_to_sixty_seconds() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.compile.timeout, Duration::from_secs(60));
    }

    #[test]
    fn zero_compile_timeout_is_rejected() {
        let mut raw = RawSettings::default();
        raw.compile.timeout_seconds = Some(0);
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "compile.timeout_seconds"
        ));
    }

    #[test]
    fn output_base_url_is_validated_and_trimmed() {
        let mut raw = RawSettings::default();
        raw.compile.output_base_url = Some("http://clsi.example.com/".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.compile.output_base_url, "http://clsi.example.com");

        let mut raw = RawSettings::default();
        raw.compile.output_base_url = Some("not a url".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn output_url_prefix_defaults_to_empty_and_stays_empty() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.compile.output_url_prefix, "");

        let mut raw = RawSettings::default();
        raw.compile.output_url_prefix = Some(String::new());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.compile.output_url_prefix, "");
    }

    #[test]
    fn engine_url_gains_a_trailing_slash() {
        let mut raw = RawSettings::default();
        raw.engine.url = Some("http://engine.internal:3023/clsi".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.engine.url.path(), "/clsi/");
    }

    #[test]
    fn allowed_images_default_to_unrestricted() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert!(settings.images.allowed.is_empty());
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["torchio"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_serve_arguments() {
        let args = CliArgs::parse_from([
            "torchio",
            "serve",
            "--server-port",
            "8080",
            "--compile-timeout-seconds",
            "120",
            "--engine-url",
            "http://engine.internal:3023",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_port, Some(8080));
                assert_eq!(serve.overrides.compile_timeout_seconds, Some(120));
                assert_eq!(
                    serve.overrides.engine_url.as_deref(),
                    Some("http://engine.internal:3023")
                );
            }
        }
    }
}
