//! WebAssembly bindings for the Cosmic Catan engine.
//!
//! This module exposes a [`GameSession`] to JavaScript through wasm-bindgen.
//! Everything crosses the boundary as JSON strings.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::GameAction;
#[cfg(feature = "wasm")]
use crate::config::GameConfig;
#[cfg(feature = "wasm")]
use crate::persist;
#[cfg(feature = "wasm")]
use crate::session::GameSession;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON `GameConfig` (missing fields use defaults)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;

        let session = GameSession::new(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { session })
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(self.session.state()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current player ID
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> u8 {
        self.session.state().current_player
    }

    /// Get valid actions for a player as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self, player: u8) -> String {
        let actions = self.session.valid_actions(player);
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON, returns events JSON or the error as JSON
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, player: u8, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.session.dispatch(player, action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(
                &serde_json::to_string(&e).unwrap_or_else(|_| e.to_string()),
            )),
        }
    }

    /// Get the winner (if game is finished)
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.session.state().winner()
    }

    /// Snapshot of the whole game, for the page to store
    #[wasm_bindgen]
    pub fn save(&self) -> Result<String, JsValue> {
        persist::to_snapshot(self.session.state()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Restore a snapshot; false if it is stale or corrupt
    #[wasm_bindgen]
    pub fn load(&mut self, snapshot: &str) -> bool {
        self.session.load_snapshot(snapshot)
    }
}
