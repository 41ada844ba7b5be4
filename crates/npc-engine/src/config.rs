//! Layered process configuration: defaults, an optional `npc-engine.yaml`
//! file, then environment overrides (`APP__` prefix, `__` as the nesting
//! separator), built on the `config` crate.
//!
//! The nested simulation-tuning structs (`TimeConfig`, `TieringConfig`,
//! `ProximityConfig`, `GroupConfig`, `FactionConfig`) already derive
//! `Deserialize` with spec-matching defaults (see `npc-core`'s `config`
//! module docs), so they nest directly here. `VitalsConfig`/`MemoryConfig`
//! (`npc-agents`) and the Oracle/Postgres configs do not: the former two
//! stay at their hardcoded defaults for now (no deployment has yet needed
//! to override them, and adding `Deserialize` to a crate that otherwise
//! has no file-I/O concerns felt like scope creep for this pass), and the
//! latter two are loaded through their own existing constructors
//! ([`npc_oracle::OracleConfig::from_env`], [`npc_store::PostgresConfig::new`])
//! since they were already built for exactly that purpose.

use serde::{Deserialize, Serialize};

use npc_core::config::{FactionConfig, GroupConfig, ProximityConfig, TieringConfig, TimeConfig};

/// Top-level process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Host:port the Boundary HTTP server binds to.
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Postgres connection string. `PostgresConfig::new` applies its own
    /// pool-sizing and timeout defaults on top of this.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Run `sqlx::migrate!` against `database_url` at startup.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,

    /// Optional NATS server for external event fan-out; absent disables it.
    #[serde(default)]
    pub nats_url: Option<String>,

    pub time: TimeConfig,
    pub tiering: TieringConfig,
    pub proximity: ProximityConfig,
    pub group: GroupConfig,
    pub faction: FactionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_port: default_bind_port(),
            database_url: default_database_url(),
            run_migrations: default_run_migrations(),
            nats_url: None,
            time: TimeConfig::default(),
            tiering: TieringConfig::default(),
            proximity: ProximityConfig::default(),
            group: GroupConfig::default(),
            faction: FactionConfig::default(),
        }
    }
}

const fn default_bind_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    String::from("postgres://localhost/npc")
}

const fn default_run_migrations() -> bool {
    true
}

impl EngineConfig {
    /// Load configuration: built-in defaults, then `npc-engine.yaml` in the
    /// current directory if present, then `APP__`-prefixed environment
    /// variables (e.g. `APP__BIND_PORT=9000`, `APP__TIME__TIME_SCALE=2.0`).
    ///
    /// # Errors
    ///
    /// Returns [`config::ConfigError`] if the YAML file is present but
    /// malformed, or an override cannot be coerced into its target type.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let figment = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name("npc-engine").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        figment.try_deserialize()
    }
}
