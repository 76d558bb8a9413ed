use clap::builder::TypedValueParser as _;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use log::LevelFilter;
use secrecy::SecretString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default S3-compatible Object Storage endpoint.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.yandexcloud.net";
/// Region the storage endpoint signs requests for.
pub const DEFAULT_STORAGE_REGION: &str = "ru-central1";
/// Base URL of the SpeechKit recognition API.
pub const DEFAULT_TRANSCRIPTION_BASE_URL: &str = "https://transcribe.api.cloud.yandex.net";
/// Base URL of the Operation API used to poll long-running jobs.
pub const DEFAULT_OPERATION_BASE_URL: &str = "https://operation.api.cloud.yandex.net";

/// When the uploaded audio object is removed from the bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CleanupPolicy {
    /// Delete after every terminal state, and after a rejected submission.
    Always,
    /// Delete only once a transcript has been extracted.
    OnSuccess,
}

impl fmt::Display for CleanupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CleanupPolicy::Always => write!(f, "always"),
            CleanupPolicy::OnSuccess => write!(f, "on-success"),
        }
    }
}

/// A required configuration value that is absent or blank.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "required configuration value {name} is not set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated secrets and bucket, handed to the gateway constructors.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub api_key: SecretString,
    pub bucket: String,
}

#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path of the audio file to transcribe.
    #[arg(short, long, env)]
    pub audio_file: PathBuf,

    /// Secret part of the static access key used for Object Storage.
    #[arg(long, env = "KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Identifier of the static access key used for Object Storage.
    #[arg(long, env = "IDAPIKEY", hide_env_values = true)]
    access_key_id: Option<String>,

    /// Service account API key sent to SpeechKit and the Operation API.
    #[arg(long, env = "APIKEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Bucket the audio file is uploaded to.
    #[arg(short, long, env = "BUCKET")]
    bucket: Option<String>,

    /// The S3-compatible storage endpoint. Also the prefix of the URI handed to SpeechKit.
    #[arg(long, env, default_value = DEFAULT_STORAGE_ENDPOINT)]
    storage_endpoint: String,

    /// The storage region used to sign requests.
    #[arg(long, env, default_value = DEFAULT_STORAGE_REGION)]
    storage_region: String,

    /// The base URL of the SpeechKit recognition API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_TRANSCRIPTION_BASE_URL)]
    transcription_base_url: String,

    /// The base URL of the Operation API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_OPERATION_BASE_URL)]
    operation_base_url: String,

    /// Language of the recording.
    #[arg(long, env, default_value = "ru-RU")]
    pub language_code: String,

    /// Recognition model; the provider default is used when unset.
    #[arg(long, env)]
    pub recognition_model: Option<String>,

    /// Ask the provider to mask profanity in the transcript.
    #[arg(long, env)]
    pub profanity_filter: Option<bool>,

    /// Client-side timeout in seconds for a single HTTP request
    #[arg(long, env, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Milliseconds between two status queries
    #[arg(long, env, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Seconds after which polling gives up and reports a timeout
    #[arg(long, env, default_value_t = 60)]
    pub poll_timeout_secs: u64,

    /// Consecutive transient poll failures tolerated before polling is aborted.
    #[arg(long, env, default_value_t = 3)]
    pub max_poll_retries: u32,

    /// Retries of a single status request inside the HTTP client.
    /// One outage costs at most (status_request_retries + 1) * (max_poll_retries + 1) requests.
    #[arg(long, env, default_value_t = 1)]
    pub status_request_retries: u32,

    /// Seconds the uploaded object's deletion may take before it is abandoned
    #[arg(long, env, default_value_t = 10)]
    pub cleanup_timeout_secs: u64,

    /// Delay in milliseconds before the first retry of a failed status request
    #[arg(long, env, default_value_t = 100)]
    pub retry_base_delay_ms: u64,

    /// Upper bound in milliseconds for the delay between retries
    #[arg(long, env, default_value_t = 2000)]
    pub retry_max_delay_ms: u64,

    /// When to delete the uploaded audio from the bucket
    #[arg(long, env, value_enum, default_value_t = CleanupPolicy::Always)]
    pub cleanup_policy: CleanupPolicy,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");

        f.debug_struct("Config")
            .field("audio_file", &self.audio_file)
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("access_key_id", &self.access_key_id)
            .field("api_key", &redacted(&self.api_key))
            .field("bucket", &self.bucket)
            .field("storage_endpoint", &self.storage_endpoint)
            .field("storage_region", &self.storage_region)
            .field("transcription_base_url", &self.transcription_base_url)
            .field("operation_base_url", &self.operation_base_url)
            .field("language_code", &self.language_code)
            .field("recognition_model", &self.recognition_model)
            .field("profanity_filter", &self.profanity_filter)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("max_poll_retries", &self.max_poll_retries)
            .field("status_request_retries", &self.status_request_retries)
            .field("cleanup_timeout_secs", &self.cleanup_timeout_secs)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("cleanup_policy", &self.cleanup_policy)
            .field("log_level_filter", &self.log_level_filter)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Validates the required secrets and bucket.
    ///
    /// Every value must be present and non-blank; this runs before any I/O.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let api_key = required(&self.api_key, "APIKEY")?;
        let secret_access_key = required(&self.secret_access_key, "KEY")?;
        let access_key_id = required(&self.access_key_id, "IDAPIKEY")?;
        let bucket = required(&self.bucket, "BUCKET")?;

        Ok(Credentials {
            access_key_id,
            secret_access_key: SecretString::new(secret_access_key),
            api_key: SecretString::new(api_key),
            bucket,
        })
    }

    pub fn audio_file(&self) -> &Path {
        &self.audio_file
    }

    pub fn storage_endpoint(&self) -> &str {
        self.storage_endpoint.trim_end_matches('/')
    }

    pub fn storage_region(&self) -> &str {
        &self.storage_region
    }

    /// Returns the SpeechKit API base URL.
    pub fn transcription_base_url(&self) -> &str {
        self.transcription_base_url.trim_end_matches('/')
    }

    /// Returns the Operation API base URL.
    pub fn operation_base_url(&self) -> &str {
        self.operation_base_url.trim_end_matches('/')
    }

    pub fn set_transcription_base_url(mut self, url: String) -> Self {
        self.transcription_base_url = url;
        self
    }

    pub fn set_operation_base_url(mut self, url: String) -> Self {
        self.operation_base_url = url;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_secs(self.cleanup_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;

    const REQUIRED: [(&str, &str); 4] = [
        ("--secret-access-key", "secret"),
        ("--access-key-id", "key-id"),
        ("--api-key", "api-key"),
        ("--bucket", "audio-bucket"),
    ];

    fn parse_with(overrides: &[(&str, &str)]) -> Config {
        let mut args = vec![
            "speechkit_transcriber".to_string(),
            "--audio-file".to_string(),
            "/tmp/voice.ogg".to_string(),
        ];
        for (flag, default) in REQUIRED {
            let value = overrides
                .iter()
                .find(|(f, _)| *f == flag)
                .map(|(_, v)| *v)
                .unwrap_or(default);
            args.push(format!("{flag}={value}"));
        }
        Config::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn test_defaults_match_speechkit_endpoints() {
        let config = parse_with(&[]);

        assert_eq!(config.storage_endpoint(), DEFAULT_STORAGE_ENDPOINT);
        assert_eq!(config.transcription_base_url(), DEFAULT_TRANSCRIPTION_BASE_URL);
        assert_eq!(config.operation_base_url(), DEFAULT_OPERATION_BASE_URL);
        assert_eq!(config.language_code, "ru-RU");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.poll_timeout(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.cleanup_policy, CleanupPolicy::Always);
        assert_eq!(config.max_poll_retries, 3);
        assert_eq!(config.status_request_retries, 1);
        assert_eq!(config.cleanup_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = parse_with(&[
            ("--secret-access-key", "super-secret-value"),
            ("--api-key", "api-key-value"),
        ]);

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("api-key-value"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("audio-bucket"));
    }

    #[test]
    fn test_poll_and_request_retry_budgets_are_independent() {
        let config = Config::try_parse_from([
            "speechkit_transcriber",
            "--audio-file",
            "voice.ogg",
            "--max-poll-retries",
            "5",
            "--status-request-retries",
            "0",
        ])
        .unwrap();

        assert_eq!(config.max_poll_retries, 5);
        assert_eq!(config.status_request_retries, 0);
    }

    #[test]
    fn test_credentials_valid_when_all_values_present() {
        let config = parse_with(&[]);

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.access_key_id, "key-id");
        assert_eq!(credentials.bucket, "audio-bucket");
        assert_eq!(credentials.api_key.expose_secret(), "api-key");
        assert_eq!(credentials.secret_access_key.expose_secret(), "secret");
    }

    #[test]
    fn test_any_blank_required_value_is_rejected() {
        let cases = [
            ("--secret-access-key", "KEY"),
            ("--access-key-id", "IDAPIKEY"),
            ("--api-key", "APIKEY"),
            ("--bucket", "BUCKET"),
        ];

        for (flag, name) in cases {
            let config = parse_with(&[(flag, "  ")]);
            assert_eq!(
                config.credentials().unwrap_err(),
                ConfigError::Missing(name),
                "{flag} left blank should be reported"
            );
        }
    }

    // The only test that touches these variables; every other test passes the
    // required values as flags, which take precedence over the environment.
    #[test]
    fn test_credentials_read_from_environment() {
        let parse = || {
            Config::try_parse_from(["speechkit_transcriber", "--audio-file", "voice.ogg"]).unwrap()
        };

        env::set_var("KEY", "env-secret");
        env::set_var("IDAPIKEY", "env-key-id");
        env::set_var("APIKEY", "env-api-key");
        env::set_var("BUCKET", "env-bucket");
        let complete = parse().credentials();

        env::remove_var("APIKEY");
        let missing_api_key = parse().credentials();

        env::remove_var("KEY");
        env::remove_var("IDAPIKEY");
        env::remove_var("BUCKET");

        let credentials = complete.unwrap();
        assert_eq!(credentials.bucket, "env-bucket");
        assert_eq!(credentials.api_key.expose_secret(), "env-api-key");
        assert_eq!(missing_api_key.unwrap_err(), ConfigError::Missing("APIKEY"));
    }

    #[test]
    fn test_cleanup_policy_parses_kebab_case() {
        let config = Config::try_parse_from([
            "speechkit_transcriber",
            "--audio-file",
            "voice.ogg",
            "--cleanup-policy",
            "on-success",
        ])
        .unwrap();

        assert_eq!(config.cleanup_policy, CleanupPolicy::OnSuccess);
    }

    #[test]
    fn test_base_urls_drop_trailing_slash() {
        let config = parse_with(&[])
            .set_transcription_base_url("http://127.0.0.1:1234/".to_string())
            .set_operation_base_url("http://127.0.0.1:5678/".to_string());

        assert_eq!(config.transcription_base_url(), "http://127.0.0.1:1234");
        assert_eq!(config.operation_base_url(), "http://127.0.0.1:5678");
    }
}
