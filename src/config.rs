use std::time::Duration;

// ============================================================================
// Configuration
// ============================================================================
//
// Loaded from the environment (after `.env`, see main). Defaults match a
// local `dapr run` of the three apps, so nothing needs to be set for the
// workshop setup.
//
// ============================================================================

/// Which of the three apps this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    Store,
    Kitchen,
    Delivery,
}

impl ServiceKind {
    /// App id the sidecar knows this service by
    pub fn app_id(self) -> &'static str {
        match self {
            ServiceKind::Store => "pizza-store",
            ServiceKind::Kitchen => "pizza-kitchen",
            ServiceKind::Delivery => "pizza-delivery",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            ServiceKind::Store => 8001,
            ServiceKind::Kitchen => 6001,
            ServiceKind::Delivery => 8003,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Sidecar endpoint and the component names the apps agree on
#[derive(Debug, Clone)]
pub struct SidecarSettings {
    pub http_endpoint: String,
    pub api_token: Option<String>,
    pub pubsub_name: String,
    pub topic: String,
    pub state_store: String,
    pub kitchen_app_id: String,
    pub delivery_app_id: String,
    pub timeout: Duration,
}

impl Default for SidecarSettings {
    fn default() -> Self {
        Self {
            http_endpoint: "http://127.0.0.1:3500".to_string(),
            api_token: None,
            pubsub_name: "pizzapubsub".to_string(),
            topic: "order".to_string(),
            state_store: "pizzastatestore".to_string(),
            kitchen_app_id: ServiceKind::Kitchen.app_id().to_string(),
            delivery_app_id: ServiceKind::Delivery.app_id().to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Multiplier applied to every simulated delay. 0 makes the pipeline instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    scale: f64,
}

impl Timing {
    pub const REAL: Timing = Timing { scale: 1.0 };
    pub const INSTANT: Timing = Timing { scale: 0.0 };

    pub fn new(scale: f64) -> Option<Self> {
        (scale.is_finite() && scale >= 0.0).then_some(Self { scale })
    }

    /// Saturates at `Duration::MAX` when the product does not fit.
    pub fn scaled(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.scale).unwrap_or(Duration::MAX)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::REAL
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceKind,
    pub host: String,
    pub port: u16,
    pub sidecar: SidecarSettings,
    pub timing: Timing,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env(service: ServiceKind) -> Result<Self, ConfigError> {
        Self::from_lookup(service, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(service: ServiceKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = SidecarSettings::default();

        let port = match var("APP_PORT") {
            Some(raw) => parse_port("APP_PORT", &raw)?,
            None => service.default_port(),
        };

        let http_endpoint = match (var("DAPR_HTTP_ENDPOINT"), var("DAPR_HTTP_PORT")) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/').to_string(),
            (None, Some(raw)) => format!("http://127.0.0.1:{}", parse_port("DAPR_HTTP_PORT", &raw)?),
            (None, None) => defaults.http_endpoint,
        };

        let timeout = match var("SIDECAR_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SIDECAR_TIMEOUT_SECS",
                value: raw.clone(),
                expected: "a whole number of seconds",
            })?),
            None => defaults.timeout,
        };

        let timing = match var("PIZZA_TIME_SCALE") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Timing::new)
                .ok_or(ConfigError::Invalid {
                    name: "PIZZA_TIME_SCALE",
                    value: raw.clone(),
                    expected: "a non-negative number",
                })?,
            None => Timing::default(),
        };

        Ok(Self {
            service,
            host: var("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            sidecar: SidecarSettings {
                http_endpoint,
                api_token: var("DAPR_API_TOKEN"),
                pubsub_name: var("DAPR_PUBSUB_NAME").unwrap_or(defaults.pubsub_name),
                topic: var("DAPR_PUBSUB_TOPIC").unwrap_or(defaults.topic),
                state_store: var("DAPR_STATE_STORE").unwrap_or(defaults.state_store),
                kitchen_app_id: var("KITCHEN_APP_ID").unwrap_or(defaults.kitchen_app_id),
                delivery_app_id: var("DELIVERY_APP_ID").unwrap_or(defaults.delivery_app_id),
                timeout,
            },
            timing,
        })
    }
}

fn parse_port(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        expected: "a TCP port",
    })
}
