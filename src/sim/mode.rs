//! Game-mode state machine
//!
//! ```text
//! Title --directional--> Playing --outcome--> Won | Lost
//!                           ^                    |
//!                           +------restart-------+
//! Title | Won | Lost --quit--> exit
//! ```
//!
//! Transitions are evaluated once per frame, before any entity update.
//! Outcomes produced while stepping are latched and applied on the next
//! evaluation.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;

/// Current mode of a running game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Waiting for the first directional input
    #[default]
    Title,
    Playing,
    Won,
    Lost,
}

impl GameMode {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameMode::Won | GameMode::Lost)
    }

    /// Whether entities of this kind advance while in this mode.
    ///
    /// Only cosmetic entities keep moving outside of play.
    pub fn simulates(self, kind: EntityKind) -> bool {
        self == GameMode::Playing || kind.capabilities().cosmetic
    }
}

/// End-of-round result reported by game rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// The slice of input the mode machine cares about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeInput {
    pub directional: bool,
    pub restart: bool,
    pub quit: bool,
}

/// What happened during one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    /// Title -> Playing
    Start,
    /// Won/Lost -> Playing; caller must reset the world
    Restart,
    /// Playing -> Won/Lost
    Finish(Outcome),
    /// Leave the game loop
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    mode: GameMode,
    latched: Option<Outcome>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Record an outcome for the next evaluation; the first one wins
    pub fn latch(&mut self, outcome: Outcome) {
        if self.mode == GameMode::Playing && self.latched.is_none() {
            log::debug!("Outcome latched: {:?}", outcome);
            self.latched = Some(outcome);
        }
    }

    pub fn latched(&self) -> Option<Outcome> {
        self.latched
    }

    /// Run the transition logic for this frame
    pub fn evaluate(&mut self, input: &ModeInput) -> Transition {
        let transition = match self.mode {
            GameMode::Title if input.quit => Transition::Quit,
            GameMode::Title if input.directional => {
                self.mode = GameMode::Playing;
                Transition::Start
            }
            GameMode::Playing => match self.latched.take() {
                Some(outcome) => {
                    self.mode = match outcome {
                        Outcome::Won => GameMode::Won,
                        Outcome::Lost => GameMode::Lost,
                    };
                    Transition::Finish(outcome)
                }
                None => Transition::Stay,
            },
            GameMode::Won | GameMode::Lost if input.quit => Transition::Quit,
            GameMode::Won | GameMode::Lost if input.restart => {
                self.mode = GameMode::Playing;
                self.latched = None;
                Transition::Restart
            }
            _ => Transition::Stay,
        };

        if transition != Transition::Stay {
            log::info!("Mode {:?} after {:?}", self.mode, transition);
        }
        transition
    }
}
