//! Simulator configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// One simulated cast: the spell's display name and the XP it grants.
#[derive(Clone, Debug, PartialEq)]
pub struct Cast {
    pub spell: String,
    pub xp: f32,
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub config_path: Option<PathBuf>,
    pub world_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    /// Casts to replay. Empty means one cast of every tracked spell.
    pub casts: Vec<Cast>,
    pub cast_interval: Duration,
    pub default_xp: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            world_path: None,
            log_dir: None,
            casts: Vec::new(),
            cast_interval: Duration::from_millis(200),
            default_xp: 10.0,
        }
    }
}

impl SimConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SPELL_PROGRESS_CONFIG` - Plugin TOML (default: bundled sample)
    /// - `SPELL_PROGRESS_WORLD` - World RON fixture (default: bundled sample)
    /// - `SPELL_PROGRESS_LOG_DIR` - Also write logs to `sim.log` in this directory
    /// - `SPELL_PROGRESS_CASTS` - Comma-separated `Name[:xp]` list (default: every tracked spell)
    /// - `SPELL_PROGRESS_CAST_INTERVAL_MS` - Delay between casts (default: 200)
    /// - `SPELL_PROGRESS_DEFAULT_XP` - XP for casts without an explicit amount (default: 10)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.config_path = env::var("SPELL_PROGRESS_CONFIG").ok().map(PathBuf::from);
        config.world_path = env::var("SPELL_PROGRESS_WORLD").ok().map(PathBuf::from);
        config.log_dir = env::var("SPELL_PROGRESS_LOG_DIR").ok().map(PathBuf::from);

        if let Some(xp) = read_env::<f32>("SPELL_PROGRESS_DEFAULT_XP") {
            config.default_xp = xp;
        }
        if let Some(ms) = read_env::<u64>("SPELL_PROGRESS_CAST_INTERVAL_MS") {
            config.cast_interval = Duration::from_millis(ms);
        }
        if let Ok(casts) = env::var("SPELL_PROGRESS_CASTS") {
            config.casts = parse_casts(&casts, config.default_xp);
        }

        config
    }
}

/// Parse `Fireblast:25, Ice Lance` into casts. Entries with an unparsable
/// amount fall back to `default_xp`.
pub fn parse_casts(list: &str, default_xp: f32) -> Vec<Cast> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.rsplit_once(':') {
            Some((spell, xp)) => Cast {
                spell: spell.trim().to_string(),
                xp: xp.trim().parse().unwrap_or(default_xp),
            },
            None => Cast {
                spell: entry.to_string(),
                xp: default_xp,
            },
        })
        .collect()
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
