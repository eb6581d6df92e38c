//! Settings: a TOML file, then `BINDAY_*` environment overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use binday_provider_itouchvision::ItouchVisionConfig;
use directories::ProjectDirs;
use serde::Deserialize;

const CONFIG_FILE: &str = "binday.toml";
const DEFAULT_COUNCIL_NAME: &str = "your council";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const ENV_BASE_URL: &str = "BINDAY_SERVICE_BASE_URL";
const ENV_ACCOUNT_GUID: &str = "BINDAY_ACCOUNT_GUID";
const ENV_CLIENT_ID: &str = "BINDAY_CLIENT_ID";
const ENV_COUNCIL_ID: &str = "BINDAY_COUNCIL_ID";

#[derive(thiserror::Error, Debug)]
pub(crate) enum ConfigError {
    #[error("cannot read {path}: {source}", path = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML in {path}: {source}", path = .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required option `{option}` (set it in binday.toml or via {var})")]
    Missing {
        option: &'static str,
        var: &'static str,
    },
    #[error("{var} must be a whole number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("could not determine the platform configuration directory")]
    NoProjectDirs,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct LogSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Where the rolling log files go.
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            directory: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Settings {
    pub service: ItouchVisionConfig,
    pub council_name: String,
    pub show_schedule_errors: bool,
    pub request_timeout: Duration,
    pub log: LogSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    #[serde(alias = "councilName")]
    council_name: Option<String>,
    #[serde(alias = "showScheduleErrors")]
    show_schedule_errors: bool,
    #[serde(alias = "requestTimeoutSecs")]
    request_timeout_secs: Option<u64>,
    service: ServiceSection,
    log: LogSettings,
}

// Every field is optional here so the environment can fill the gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceSection {
    #[serde(alias = "serviceBaseUrl")]
    service_base_url: Option<String>,
    #[serde(alias = "accountGuid")]
    account_guid: Option<String>,
    #[serde(alias = "clientId")]
    client_id: Option<u32>,
    #[serde(alias = "councilId")]
    council_id: Option<u32>,
}

impl ServiceSection {
    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.service_base_url = Some(url);
        }
        if let Some(guid) = lookup(ENV_ACCOUNT_GUID) {
            self.account_guid = Some(guid);
        }
        if let Some(raw) = lookup(ENV_CLIENT_ID) {
            self.client_id = Some(parse_number(ENV_CLIENT_ID, &raw)?);
        }
        if let Some(raw) = lookup(ENV_COUNCIL_ID) {
            self.council_id = Some(parse_number(ENV_COUNCIL_ID, &raw)?);
        }
        Ok(())
    }

    fn resolve(self) -> Result<ItouchVisionConfig, ConfigError> {
        Ok(ItouchVisionConfig {
            service_base_url: non_blank(self.service_base_url).ok_or(ConfigError::Missing {
                option: "service_base_url",
                var: ENV_BASE_URL,
            })?,
            account_guid: non_blank(self.account_guid).ok_or(ConfigError::Missing {
                option: "account_guid",
                var: ENV_ACCOUNT_GUID,
            })?,
            client_id: self.client_id.ok_or(ConfigError::Missing {
                option: "client_id",
                var: ENV_CLIENT_ID,
            })?,
            council_id: self.council_id.ok_or(ConfigError::Missing {
                option: "council_id",
                var: ENV_COUNCIL_ID,
            })?,
        })
    }
}

impl Settings {
    /// Load from `explicit` (must exist) or the platform config file (may be absent),
    /// then apply the process environment.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (project_dirs()?.config_dir().join(CONFIG_FILE), false),
        };

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => String::new(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        Self::from_sources(&text, &path, |var| env::var(var).ok())
    }

    pub(crate) fn from_sources<F>(
        toml_text: &str,
        origin: &Path,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file: FileSettings =
            toml::from_str(toml_text).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        file.service.apply_env(&lookup)?;

        Ok(Self {
            service: file.service.resolve()?,
            council_name: non_blank(file.council_name)
                .unwrap_or_else(|| DEFAULT_COUNCIL_NAME.to_owned()),
            show_schedule_errors: file.show_schedule_errors,
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            log: file.log,
        })
    }
}

/// Fallback directory for log files.
pub(crate) fn default_log_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_local_dir().join("logs"))
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "binday", "binday").ok_or(ConfigError::NoProjectDirs)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn parse_number(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_err| ConfigError::InvalidNumber {
            var,
            value: raw.to_owned(),
        })
}
