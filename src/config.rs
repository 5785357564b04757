use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::search::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "CONTAINER_LOADER_API_HOST";
    const PORT_VAR: &'static str = "CONTAINER_LOADER_API_PORT";

    fn from_env() -> Self {
        let host_value = env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    var = Self::HOST_VAR,
                    value = %host_value,
                    error = %err,
                    fallback = Self::DEFAULT_HOST,
                    "Could not parse host"
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    tracing::warn!(
                        var = Self::PORT_VAR,
                        fallback = Self::DEFAULT_PORT,
                        "Port must not be 0"
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    tracing::warn!(
                        var = Self::PORT_VAR,
                        value = %raw,
                        error = %err,
                        fallback = Self::DEFAULT_PORT,
                        "Could not parse port"
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Configuration for the placement engine.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const WALL_CLEARANCE_VAR: &'static str = "CONTAINER_LOADER_WALL_CLEARANCE";
    const BOX_GAP_VAR: &'static str = "CONTAINER_LOADER_BOX_GAP";
    const SCAN_STEP_RATIO_VAR: &'static str = "CONTAINER_LOADER_SCAN_STEP_RATIO";
    const MIN_SCAN_STEP_VAR: &'static str = "CONTAINER_LOADER_MIN_SCAN_STEP";

    fn from_env() -> Self {
        let wall_clearance = load_f64_with_warning(
            Self::WALL_CLEARANCE_VAR,
            PackingConfig::DEFAULT_WALL_CLEARANCE,
            |value| value >= 0.0,
            "must be 0 or greater",
            "Adjusted wall clearance changes usable interior",
        );

        let box_gap = load_f64_with_warning(
            Self::BOX_GAP_VAR,
            PackingConfig::DEFAULT_BOX_GAP,
            |value| value >= 0.0,
            "must be 0 or greater",
            "Adjusted box gap changes achievable utilization",
        );

        let scan_step_ratio = load_f64_with_warning(
            Self::SCAN_STEP_RATIO_VAR,
            PackingConfig::DEFAULT_SCAN_STEP_RATIO,
            |value| value > 0.0 && value <= 1.0,
            "must be greater than 0 and at most 1",
            "Adjusted scan step may merge distinct candidate points",
        );

        let min_scan_step = load_f64_with_warning(
            Self::MIN_SCAN_STEP_VAR,
            PackingConfig::DEFAULT_MIN_SCAN_STEP,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted minimum scan step may merge distinct candidate points",
        );

        let packing = PackingConfig::builder()
            .wall_clearance(wall_clearance)
            .box_gap(box_gap)
            .scan_step_ratio(scan_step_ratio)
            .min_scan_step(min_scan_step)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl From<PackingConfig> for OptimizerConfig {
    fn from(packing: PackingConfig) -> Self {
        Self { packing }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!(var = name, error = %err, "Access failed, using default value");
            None
        }
    }
}

fn parse_f64_with_fallback(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => value,
        Ok(_) => {
            tracing::warn!(
                var = var_name,
                value = raw,
                hint = invalid_hint,
                fallback = default,
                "Invalid value"
            );
            default
        }
        Err(err) => {
            tracing::warn!(
                var = var_name,
                value = raw,
                error = %err,
                fallback = default,
                "Could not parse number"
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    let Some(raw) = env_string(var_name) else {
        return default;
    };
    let value = parse_f64_with_fallback(var_name, &raw, default, validator, invalid_hint);
    let tolerance = (default.abs().max(1.0)) * 1e-9;
    if (value - default).abs() > tolerance {
        tracing::info!(var = var_name, value, "{}", warning);
    }
    value
}
