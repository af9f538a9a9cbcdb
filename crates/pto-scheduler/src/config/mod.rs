use crate::workflows::leave::{CapacityPolicy, DuplicatePolicy, ShiftCode};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scheduling: SchedulingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw)?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            scheduling: SchedulingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(raw.to_string())),
        }
    }
}

/// Capacity limits, lock behavior, and roster seeding for the leave scheduler.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub shift_limits: BTreeMap<ShiftCode, u32>,
    pub slot_lock_timeout: Duration,
    pub duplicate_policy: DuplicatePolicy,
    pub notification_sender: String,
    pub staff_roster_csv: Option<PathBuf>,
}

pub const DEFAULT_SHIFT_LIMITS: &str = "1=25,2=15,3=7";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;
pub const DEFAULT_NOTIFICATION_SENDER: &str = "admin@nj.doc.gov";

impl SchedulingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let shift_limits = parse_shift_limits(
            &env::var("PTO_SHIFT_LIMITS").unwrap_or_else(|_| DEFAULT_SHIFT_LIMITS.to_string()),
        )?;

        let timeout_ms = match env::var("PTO_LOCK_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidLockTimeout(raw.clone()))?,
            Err(_) => DEFAULT_LOCK_TIMEOUT_MS,
        };

        let duplicate_policy = match env::var("PTO_DUPLICATE_POLICY") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "reject" => DuplicatePolicy::Reject,
                "allow" => DuplicatePolicy::Allow,
                _ => return Err(ConfigError::InvalidDuplicatePolicy(raw)),
            },
            Err(_) => DuplicatePolicy::Reject,
        };

        let notification_sender = env::var("PTO_NOTIFY_FROM")
            .unwrap_or_else(|_| DEFAULT_NOTIFICATION_SENDER.to_string());

        let staff_roster_csv = env::var("PTO_STAFF_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            shift_limits,
            slot_lock_timeout: Duration::from_millis(timeout_ms),
            duplicate_policy,
            notification_sender,
            staff_roster_csv,
        })
    }

    pub fn capacity_policy(&self) -> CapacityPolicy {
        CapacityPolicy::new(self.shift_limits.clone())
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            shift_limits: CapacityPolicy::standard().shifts().collect(),
            slot_lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            duplicate_policy: DuplicatePolicy::Reject,
            notification_sender: DEFAULT_NOTIFICATION_SENDER.to_string(),
            staff_roster_csv: None,
        }
    }
}

/// Parses `"<shift>=<limit>"` pairs separated by commas.
fn parse_shift_limits(raw: &str) -> Result<BTreeMap<ShiftCode, u32>, ConfigError> {
    let mut limits = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let invalid = || ConfigError::InvalidShiftLimits(pair.to_string());
        let (shift, limit) = pair.split_once('=').ok_or_else(invalid)?;
        let shift = shift.trim().parse::<u8>().map_err(|_| invalid())?;
        let limit = limit.trim().parse::<u32>().map_err(|_| invalid())?;
        limits.insert(ShiftCode(shift), limit);
    }

    if limits.is_empty() {
        return Err(ConfigError::InvalidShiftLimits(raw.to_string()));
    }
    Ok(limits)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidShiftLimits(String),
    InvalidLockTimeout(String),
    InvalidDuplicatePolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidShiftLimits(value) => write!(
                f,
                "PTO_SHIFT_LIMITS must look like '1=25,2=15,3=7', could not read '{value}'"
            ),
            ConfigError::InvalidLockTimeout(value) => write!(
                f,
                "PTO_LOCK_TIMEOUT_MS must be a whole number of milliseconds, got '{value}'"
            ),
            ConfigError::InvalidDuplicatePolicy(value) => write!(
                f,
                "PTO_DUPLICATE_POLICY must be 'reject' or 'allow', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
