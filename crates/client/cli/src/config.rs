//! Environment-driven configuration for the terminal driver.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use lasertank_core::{Cheats, Inventory, Item};
use lasertank_runtime::RuntimeConfig;

/// Terminal driver configuration.
#[derive(Clone, Debug)]
pub struct CliConfig {
    /// Layout file to load. The built-in practice arena is used when unset.
    pub level: Option<PathBuf>,
    pub action_delay: Duration,
    pub animation_interval: Duration,
    pub cheats: Cheats,
    pub inventory: Inventory,
    /// Print every event as a JSON line instead of prose.
    pub json_events: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            level: None,
            action_delay: RuntimeConfig::DEFAULT_ACTION_DELAY,
            animation_interval: RuntimeConfig::DEFAULT_ANIMATION_INTERVAL,
            cheats: Cheats::empty(),
            inventory: Inventory::new(),
            json_events: false,
        }
    }
}

impl CliConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LASERTANK_LEVEL` - Path to a layout file
    /// - `LASERTANK_ACTION_DELAY_MS` - Pause between turn iterations (default: 50)
    /// - `LASERTANK_ANIMATION_MS` - Tile animation cadence (default: 200, minimum 10)
    /// - `LASERTANK_CHEATS` - Comma separated cheat names (`swimming`, `infinite_missiles`, `power_mode`, ...); `infinite` sets every ammo flag
    /// - `LASERTANK_INVENTORY` - Comma separated `item:count`, e.g. `missile:3,bomb:1`
    /// - `LASERTANK_JSON` - Emit events as JSON lines (default: false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = env::var_os("LASERTANK_LEVEL") {
            config.level = Some(PathBuf::from(path));
        }
        if let Some(ms) = read_env::<u64>("LASERTANK_ACTION_DELAY_MS") {
            config.action_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("LASERTANK_ANIMATION_MS") {
            config.animation_interval = Duration::from_millis(ms.max(10));
        }
        if let Ok(list) = env::var("LASERTANK_CHEATS") {
            config.cheats = parse_cheats(&list);
        }
        if let Ok(list) = env::var("LASERTANK_INVENTORY") {
            config.inventory = parse_inventory(&list);
        }
        if let Some(json) = read_env_bool("LASERTANK_JSON") {
            config.json_events = json;
        }

        config
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_action_delay(self.action_delay)
            .with_animation_interval(self.animation_interval)
    }
}

fn parse_cheats(list: &str) -> Cheats {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .fold(Cheats::empty(), |cheats, name| {
            let flag = if name.eq_ignore_ascii_case("infinite") {
                Cheats::INFINITE_MISSILES
                    | Cheats::INFINITE_STUNNERS
                    | Cheats::INFINITE_BOOSTS
                    | Cheats::INFINITE_MAGNETS
                    | Cheats::INFINITE_BLUE_LASERS
                    | Cheats::INFINITE_DISRUPTORS
                    | Cheats::INFINITE_BOMBS
                    | Cheats::INFINITE_HEAT_BOMBS
                    | Cheats::INFINITE_ICE_BOMBS
            } else {
                Cheats::from_list(name).unwrap_or_else(|unknown| {
                    tracing::warn!(cheat = %unknown, "ignoring unknown cheat");
                    Cheats::empty()
                })
            };
            cheats | flag
        })
}

fn parse_inventory(list: &str) -> Inventory {
    let mut inventory = Inventory::new();
    for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let parsed = entry
            .split_once(':')
            .and_then(|(item, count)| Some((Item::from_str(item.trim()).ok()?, count.trim().parse::<u32>().ok()?)));
        match parsed {
            Some((item, count)) => inventory.add(item, count),
            None => tracing::warn!(entry, "ignoring malformed inventory entry"),
        }
    }
    inventory
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
