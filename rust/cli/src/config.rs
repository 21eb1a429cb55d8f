use dicehall_engine::hand::GameVariant;
use dicehall_table::TiePolicy;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub seed: Option<u64>,
    pub players: u8,
    pub variant: GameVariant,
    pub window_ms: u64,
    pub tie_policy: TiePolicy,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub seed: ValueSource,
    pub players: ValueSource,
    pub variant: ValueSource,
    pub window_ms: ValueSource,
    pub tie_policy: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            seed: ValueSource::Default,
            players: ValueSource::Default,
            variant: ValueSource::Default,
            window_ms: ValueSource::Default,
            tie_policy: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            players: 4,
            variant: GameVariant::Wild,
            window_ms: 1500,
            tie_policy: TiePolicy::Split,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => f.write_str(msg),
        }
    }
}

pub fn load() -> Result<Config, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Defaults, then the TOML file named by `DICEHALL_CONFIG`, then `DICEHALL_*` variables.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var("DICEHALL_CONFIG")
        && !path.is_empty()
    {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.players {
            cfg.players = v;
            sources.players = ValueSource::File;
        }
        if let Some(v) = f.variant {
            cfg.variant = v;
            sources.variant = ValueSource::File;
        }
        if let Some(v) = f.window_ms {
            cfg.window_ms = v;
            sources.window_ms = ValueSource::File;
        }
        if let Some(v) = f.tie_policy {
            cfg.tie_policy = v;
            sources.tie_policy = ValueSource::File;
        }
    }

    if let Ok(seed) = std::env::var("DICEHALL_SEED")
        && !seed.is_empty()
    {
        cfg.seed = Some(
            seed.parse()
                .map_err(|_| ConfigError::Invalid("Invalid seed".into()))?,
        );
        sources.seed = ValueSource::Env;
    }
    if let Ok(players) = std::env::var("DICEHALL_PLAYERS")
        && !players.is_empty()
    {
        cfg.players = players
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid players".into()))?;
        sources.players = ValueSource::Env;
    }
    if let Ok(variant) = std::env::var("DICEHALL_VARIANT")
        && !variant.is_empty()
    {
        cfg.variant = variant
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid variant".into()))?;
        sources.variant = ValueSource::Env;
    }
    if let Ok(window) = std::env::var("DICEHALL_WINDOW_MS")
        && !window.is_empty()
    {
        cfg.window_ms = window
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid window_ms".into()))?;
        sources.window_ms = ValueSource::Env;
    }
    if let Ok(policy) = std::env::var("DICEHALL_TIE_POLICY")
        && !policy.is_empty()
    {
        cfg.tie_policy = policy
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid tie_policy".into()))?;
        sources.tie_policy = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    players: Option<u8>,
    #[serde(default)]
    variant: Option<GameVariant>,
    #[serde(default)]
    window_ms: Option<u64>,
    #[serde(default)]
    tie_policy: Option<TiePolicy>,
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.players == 0 {
        return Err(ConfigError::Invalid(
            "Invalid configuration: players must be >=1".into(),
        ));
    }
    if cfg.window_ms == 0 || cfg.window_ms > 60_000 {
        return Err(ConfigError::Invalid(
            "Invalid configuration: window_ms must be between 1 and 60000".into(),
        ));
    }
    Ok(())
}
