//! Keyboard-driven controller

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    ControlAction, ControlContext, ControllerState, InputController, InputSignal, PhysicsConfig,
    apply_control,
};
use crate::sim::physics::PhysicsWorld;
use crate::sim::state::PieceRef;

/// Key name → action mapping.
///
/// Key names are matched case-insensitively ("a" and "A" are one key).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMap {
    bindings: BTreeMap<String, ControlAction>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, key: &str, action: ControlAction) -> Self {
        self.bindings.insert(key.to_lowercase(), action);
        self
    }

    pub fn action(&self, key: &str) -> Option<ControlAction> {
        self.bindings.get(&key.to_lowercase()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Player one: W/A/S/D with Q/E rotation
    pub fn wasd() -> Self {
        Self::new()
            .bind("a", ControlAction::MoveLeft)
            .bind("d", ControlAction::MoveRight)
            .bind("s", ControlAction::SoftDrop)
            .bind("q", ControlAction::RotateCcw)
            .bind("e", ControlAction::RotateCw)
            .bind("w", ControlAction::RotateCw)
    }

    /// Player two: arrow keys with , / . rotation
    pub fn arrows() -> Self {
        Self::new()
            .bind("ArrowLeft", ControlAction::MoveLeft)
            .bind("ArrowRight", ControlAction::MoveRight)
            .bind("ArrowDown", ControlAction::SoftDrop)
            .bind("ArrowUp", ControlAction::RotateCw)
            .bind(",", ControlAction::RotateCcw)
            .bind(".", ControlAction::RotateCw)
    }
}

/// Controller driven by key-down/key-up signals
#[derive(Debug, Clone)]
pub struct HumanController {
    keys: KeyMap,
    state: ControllerState,
}

impl HumanController {
    pub fn new(keys: KeyMap) -> Self {
        Self {
            keys,
            state: ControllerState::default(),
        }
    }

    pub fn keys(&self) -> &KeyMap {
        &self.keys
    }
}

impl InputController for HumanController {
    fn apply_inputs(
        &mut self,
        piece: &PieceRef,
        world: &mut dyn PhysicsWorld,
        cfg: &PhysicsConfig,
        _ctx: &ControlContext<'_>,
    ) {
        apply_control(world, piece.body, &self.state, cfg);
    }

    fn is_human(&self) -> bool {
        true
    }

    fn state(&self) -> ControllerState {
        self.state
    }

    fn handle_signal(&mut self, signal: &InputSignal) {
        match signal {
            InputSignal::KeyDown(key) => {
                if let Some(action) = self.keys.action(key) {
                    self.state.set(action, true);
                }
            }
            InputSignal::KeyUp(key) => {
                if let Some(action) = self.keys.action(key) {
                    self.state.set(action, false);
                }
            }
            // Release everything so no key stays stuck after a blur
            InputSignal::FocusLost => self.state = ControllerState::default(),
        }
    }

    fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}
