//! Game configuration.
//!
//! A [`GameConfig`] can be built in code, deserialized from JSON (missing
//! fields fall back to defaults), or read from the environment:
//! - `COSMIC_PLAYERS`: number of players (2-4, default 4)
//! - `COSMIC_WIN_TARGET`: victory points needed to win (default 10)
//! - `COSMIC_SEED`: RNG seed for a reproducible game

use crate::game::GameError;
use serde::{Deserialize, Serialize};

pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 4;
pub const DEFAULT_WIN_TARGET: u32 = 10;

/// Optional rule variations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    /// Settlements outside setup must touch one of the player's roads
    pub require_road_connection: bool,
    /// A roll of 7 also makes the roller move the black hole
    pub black_hole_on_seven: bool,
}

/// Everything needed to start a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_count: u8,
    pub win_target: u32,
    /// Display names; missing entries become "Player N"
    pub player_names: Vec<String>,
    /// Fixed seed for deterministic replay; entropy when absent
    pub seed: Option<u64>,
    pub rules: RuleOptions,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: MAX_PLAYERS,
            win_target: DEFAULT_WIN_TARGET,
            player_names: Vec::new(),
            seed: None,
            rules: RuleOptions::default(),
        }
    }
}

impl GameConfig {
    pub fn new(player_count: u8, win_target: u32) -> Self {
        Self {
            player_count,
            win_target,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.player_names = names;
        self
    }

    pub fn with_rules(mut self, rules: RuleOptions) -> Self {
        self.rules = rules;
        self
    }

    /// Reject configurations no game can be started with
    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(GameError::InvalidConfig(format!(
                "player count must be between {} and {}, got {}",
                MIN_PLAYERS, MAX_PLAYERS, self.player_count
            )));
        }
        if self.win_target == 0 {
            return Err(GameError::InvalidConfig(
                "win target must be at least 1".to_string(),
            ));
        }
        if self.player_names.len() > self.player_count as usize {
            return Err(GameError::InvalidConfig(format!(
                "{} names given for {} players",
                self.player_names.len(),
                self.player_count
            )));
        }
        Ok(())
    }

    /// One name per seat
    pub fn names(&self) -> Vec<String> {
        (0..self.player_count as usize)
            .map(|i| {
                self.player_names
                    .get(i)
                    .filter(|n| !n.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("Player {}", i + 1))
            })
            .collect()
    }

    /// Read the configuration from `COSMIC_*` environment variables
    pub fn from_env() -> Result<Self, GameError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, GameError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("COSMIC_PLAYERS") {
            config.player_count = parse_var("COSMIC_PLAYERS", &raw)?;
        }
        if let Some(raw) = lookup("COSMIC_WIN_TARGET") {
            config.win_target = parse_var("COSMIC_WIN_TARGET", &raw)?;
        }
        if let Some(raw) = lookup("COSMIC_SEED") {
            config.seed = Some(parse_var("COSMIC_SEED", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, GameError> {
    raw.trim()
        .parse()
        .map_err(|_| GameError::InvalidConfig(format!("{} is not a valid value: {:?}", key, raw)))
}
