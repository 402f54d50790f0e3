//! A running game: state, its random source, and optional autosave.

use crate::actions::{GameAction, GameEvent};
use crate::board::PlayerId;
use crate::config::GameConfig;
use crate::game::{GameError, GameState};
use crate::persist::{self, PersistError, SnapshotStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// Owns one game and everything needed to drive it.
///
/// Every successful action is saved to the attached store, if any.
pub struct GameSession {
    state: GameState,
    rng: StdRng,
    store: Option<Box<dyn SnapshotStore>>,
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = GameState::new(config, &mut rng)?;
        Ok(Self {
            state,
            rng,
            store: None,
        })
    }

    /// New game with default names and rules
    pub fn new_game(player_count: u8, win_target: u32) -> Result<Self, GameError> {
        Self::new(&GameConfig::new(player_count, win_target))
    }

    /// Continue the saved game in `store`, or start a new one when there is none.
    ///
    /// A resumed seeded game draws from a stream derived from the seed and the
    /// saved clock, so it never replays the dice of the game's opening.
    pub fn resume(
        config: &GameConfig,
        mut store: Box<dyn SnapshotStore>,
    ) -> Result<Self, GameError> {
        let mut session = match persist::load(&mut *store) {
            Some(state) => {
                info!(turn = state.turn_number, "resumed saved game");
                let rng = match config.seed {
                    Some(seed) => StdRng::seed_from_u64(resume_seed(seed, state.clock)),
                    None => StdRng::from_entropy(),
                };
                Self {
                    state,
                    rng,
                    store: None,
                }
            }
            None => {
                let session = Self::new(config)?;
                if let Err(e) = persist::save(&mut *store, &session.state) {
                    warn!(error = %e, "initial save failed");
                }
                session
            }
        };
        session.store = Some(store);
        Ok(session)
    }

    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        self.state.valid_actions(player)
    }

    /// Apply an action and autosave on success
    pub fn dispatch(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        let events = self.state.apply_action(player, action, &mut self.rng)?;
        if let Err(e) = self.save() {
            warn!(error = %e, "autosave failed");
        }
        Ok(events)
    }

    /// Throw the current game away (and its save) and start over
    pub fn restart(&mut self, config: &GameConfig) -> Result<(), GameError> {
        if let Some(seed) = config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.state = GameState::new(config, &mut self.rng)?;
        if let Some(store) = self.store.as_deref_mut() {
            if let Err(e) = persist::clear(store) {
                warn!(error = %e, "failed to clear previous save");
            }
        }
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), PersistError> {
        match self.store.as_deref_mut() {
            Some(store) => persist::save(store, &self.state),
            None => Ok(()),
        }
    }

    /// Replace the state with the saved one; false (and no change) if there is none
    pub fn restore(&mut self) -> bool {
        let Some(store) = self.store.as_deref_mut() else {
            return false;
        };
        match persist::load(store) {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    /// Load a snapshot string directly, leaving the store untouched
    pub fn load_snapshot(&mut self, raw: &str) -> bool {
        match persist::from_snapshot(raw) {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }
}

/// Mix the saved clock into the seed
fn resume_seed(seed: u64, clock: u64) -> u64 {
    seed ^ clock.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
