//! Session phase state machine
//!
//! ```text
//! LOBBY --begin--> PREPARING --activate--> ACTIVE --finish--> COMPLETED | FAILED
//!                      ^                                          |
//!                      +------------------prepare-----------------+
//! PREPARING | ACTIVE --pause--> PAUSED --resume--> (saved phase)
//! any non-LOBBY --stop--> LOBBY
//! ```
//!
//! The machine also owns the participant roster, since admission rules
//! depend on the phase.

use std::fmt;

use hashbrown::HashSet;
use serde::Serialize;

use crate::config::SessionSettings;
use crate::game::outcome::WaveOutcome;
use crate::host::ParticipantId;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Waiting for a game to be started
    #[default]
    Lobby,
    /// Between waves, or counting down to the next one
    Preparing,
    /// A wave's units are on the field
    Active,
    /// Frozen; the phase to restore is kept alongside
    Paused,
    /// The last wave timed out and will be repeated
    Failed,
    /// The last wave was cleared
    Completed,
}

impl GamePhase {
    /// Status line shown to participants
    pub fn message(&self) -> &'static str {
        match self {
            GamePhase::Lobby => "Waiting for players...",
            GamePhase::Preparing => "Preparing game...",
            GamePhase::Active => "Game in progress",
            GamePhase::Paused => "Game paused",
            GamePhase::Failed => "Wave failed!",
            GamePhase::Completed => "Game completed!",
        }
    }

    pub fn is_pausable(&self) -> bool {
        matches!(self, GamePhase::Preparing | GamePhase::Active)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Lobby => "LOBBY",
            GamePhase::Preparing => "PREPARING",
            GamePhase::Active => "ACTIVE",
            GamePhase::Paused => "PAUSED",
            GamePhase::Failed => "FAILED",
            GamePhase::Completed => "COMPLETED",
        };
        f.write_str(name)
    }
}

/// Rejected phase commands; the message is shown to whoever issued them
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("Game is already paused.")]
    AlreadyPaused,
    #[error("No game is running to pause.")]
    NothingToPause,
    #[error("Game is not paused.")]
    NotPaused,
    #[error("Game has no phase to resume to.")]
    NoSavedPhase,
    #[error("Cannot start a wave while the game is paused.")]
    PausedWaveStart,
    #[error("No game is running.")]
    NotRunning,
    #[error("A game is already running.")]
    AlreadyRunning,
    #[error("Not enough players to start! Need at least {required} players.")]
    NotEnoughParticipants { required: usize },
    #[error("A game is in progress. Please wait for the next round.")]
    GameInProgress,
    #[error("Cannot move from {from} to {to}.")]
    InvalidTransition { from: GamePhase, to: GamePhase },
}

/// Result of a participant joining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No game is running; the roster is collected when one starts
    Lobby,
    Joined,
    AlreadyJoined,
}

#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: GamePhase,
    paused_from: Option<GamePhase>,
    roster: HashSet<ParticipantId>,
    min_participants: usize,
    max_participants: usize,
}

impl PhaseMachine {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            phase: GamePhase::Lobby,
            paused_from: None,
            roster: HashSet::new(),
            min_participants: settings.min_participants,
            max_participants: settings.max_participants,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn paused_from(&self) -> Option<GamePhase> {
        self.paused_from
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    /// Any phase other than LOBBY
    pub fn is_running(&self) -> bool {
        self.phase != GamePhase::Lobby
    }

    pub fn roster(&self) -> &HashSet<ParticipantId> {
        &self.roster
    }

    pub fn roster_size(&self) -> usize {
        self.roster.len()
    }

    /// LOBBY -> PREPARING with the given participants as the roster
    pub fn begin(
        &mut self,
        participants: impl IntoIterator<Item = ParticipantId>,
    ) -> Result<usize, PhaseError> {
        if self.phase != GamePhase::Lobby {
            return Err(PhaseError::AlreadyRunning);
        }

        self.roster.extend(participants);
        if self.roster.len() < self.min_participants {
            self.roster.clear();
            return Err(PhaseError::NotEnoughParticipants {
                required: self.min_participants,
            });
        }

        self.phase = GamePhase::Preparing;
        Ok(self.roster.len())
    }

    /// Enter PREPARING ahead of a wave announcement
    pub fn prepare(&mut self) -> Result<(), PhaseError> {
        match self.phase {
            GamePhase::Paused => Err(PhaseError::PausedWaveStart),
            GamePhase::Lobby => Err(PhaseError::NotRunning),
            _ => {
                self.phase = GamePhase::Preparing;
                Ok(())
            }
        }
    }

    /// PREPARING -> ACTIVE once the wave's units are spawned
    pub fn activate(&mut self) -> Result<(), PhaseError> {
        self.transition(GamePhase::Preparing, GamePhase::Active)
    }

    /// ACTIVE -> COMPLETED | FAILED
    pub fn finish(&mut self, outcome: WaveOutcome) -> Result<(), PhaseError> {
        let to = match outcome {
            WaveOutcome::Completed => GamePhase::Completed,
            WaveOutcome::Failed => GamePhase::Failed,
        };
        self.transition(GamePhase::Active, to)
    }

    /// Pause from PREPARING or ACTIVE, returning the saved phase
    pub fn try_pause(&mut self) -> Result<GamePhase, PhaseError> {
        if self.phase == GamePhase::Paused {
            return Err(PhaseError::AlreadyPaused);
        }
        if !self.phase.is_pausable() {
            return Err(PhaseError::NothingToPause);
        }

        let from = self.phase;
        self.paused_from = Some(from);
        self.phase = GamePhase::Paused;
        Ok(from)
    }

    pub fn pause(&mut self) -> bool {
        self.try_pause().is_ok()
    }

    /// Restore the phase saved by the last pause
    pub fn try_resume(&mut self) -> Result<GamePhase, PhaseError> {
        if self.phase != GamePhase::Paused {
            return Err(PhaseError::NotPaused);
        }
        let to = self.paused_from.take().ok_or(PhaseError::NoSavedPhase)?;
        self.phase = to;
        Ok(to)
    }

    pub fn resume(&mut self) -> bool {
        self.try_resume().is_ok()
    }

    /// Return to LOBBY and clear the roster; false if already in LOBBY
    pub fn stop(&mut self) -> bool {
        if self.phase == GamePhase::Lobby {
            return false;
        }
        self.phase = GamePhase::Lobby;
        self.paused_from = None;
        self.roster.clear();
        true
    }

    /// Admit a participant into a running game
    ///
    /// Late joiners are only admitted while a wave is ACTIVE and the roster
    /// has room.
    pub fn join(&mut self, participant: ParticipantId) -> Result<JoinOutcome, PhaseError> {
        if self.phase == GamePhase::Lobby {
            return Ok(JoinOutcome::Lobby);
        }
        if self.roster.contains(&participant) {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        if self.phase != GamePhase::Active || self.roster.len() >= self.max_participants {
            return Err(PhaseError::GameInProgress);
        }
        self.roster.insert(participant);
        Ok(JoinOutcome::Joined)
    }

    /// Remove a participant; returns true if they were on the roster
    pub fn leave(&mut self, participant: ParticipantId) -> bool {
        self.roster.remove(&participant)
    }

    fn transition(&mut self, from: GamePhase, to: GamePhase) -> Result<(), PhaseError> {
        if self.phase != from {
            return Err(PhaseError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn machine() -> PhaseMachine {
        PhaseMachine::new(&SessionSettings::default())
    }

    fn running() -> PhaseMachine {
        let mut machine = machine();
        machine.begin([Uuid::new_v4(), Uuid::new_v4()]).unwrap();
        machine
    }

    #[test]
    fn test_begin_requires_min_participants() {
        let mut machine = PhaseMachine::new(&SessionSettings {
            min_participants: 2,
            ..SessionSettings::default()
        });

        let err = machine.begin([Uuid::new_v4()]).unwrap_err();
        assert_eq!(err, PhaseError::NotEnoughParticipants { required: 2 });
        assert_eq!(
            err.to_string(),
            "Not enough players to start! Need at least 2 players."
        );
        assert_eq!(machine.phase(), GamePhase::Lobby);
        assert_eq!(machine.roster_size(), 0);

        assert_eq!(machine.begin([Uuid::new_v4(), Uuid::new_v4()]), Ok(2));
        assert_eq!(machine.phase(), GamePhase::Preparing);
        assert_eq!(machine.begin([Uuid::new_v4()]), Err(PhaseError::AlreadyRunning));
    }

    #[test]
    fn test_pause_rejected_in_lobby_and_completed() {
        let mut machine = machine();
        assert!(!machine.pause());
        assert!(!machine.is_paused());
        assert_eq!(machine.try_pause(), Err(PhaseError::NothingToPause));

        let mut machine = running();
        machine.activate().unwrap();
        machine.finish(WaveOutcome::Completed).unwrap();
        assert_eq!(machine.phase(), GamePhase::Completed);
        assert!(!machine.pause());
        assert!(!machine.is_paused());

        machine.prepare().unwrap();
        machine.activate().unwrap();
        machine.finish(WaveOutcome::Failed).unwrap();
        assert!(!machine.pause());
    }

    #[test]
    fn test_pause_resume_restores_saved_phase() {
        let mut machine = running();
        assert!(machine.pause());
        assert!(machine.is_paused());
        assert_eq!(machine.paused_from(), Some(GamePhase::Preparing));
        assert_eq!(machine.try_pause(), Err(PhaseError::AlreadyPaused));
        assert_eq!(machine.try_resume(), Ok(GamePhase::Preparing));
        assert_eq!(machine.paused_from(), None);

        machine.activate().unwrap();
        assert_eq!(machine.try_pause(), Ok(GamePhase::Active));
        assert!(machine.resume());
        assert_eq!(machine.phase(), GamePhase::Active);
    }

    #[test]
    fn test_resume_when_not_paused() {
        let mut machine = running();
        assert!(!machine.resume());
        assert_eq!(machine.try_resume(), Err(PhaseError::NotPaused));
        assert_eq!(PhaseError::NotPaused.to_string(), "Game is not paused.");
    }

    #[test]
    fn test_prepare_rejected_while_paused() {
        let mut machine = running();
        machine.pause();
        assert_eq!(machine.prepare(), Err(PhaseError::PausedWaveStart));
        assert_eq!(machine.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_invalid_transition() {
        let mut machine = machine();
        assert_eq!(
            machine.activate(),
            Err(PhaseError::InvalidTransition {
                from: GamePhase::Lobby,
                to: GamePhase::Active,
            })
        );
        assert!(machine.finish(WaveOutcome::Completed).is_err());
    }

    #[test]
    fn test_stop_from_any_running_phase() {
        let mut machine = machine();
        assert!(!machine.stop());

        let mut machine = running();
        machine.pause();
        assert!(machine.stop());
        assert_eq!(machine.phase(), GamePhase::Lobby);
        assert_eq!(machine.paused_from(), None);
        assert_eq!(machine.roster_size(), 0);
    }

    #[test]
    fn test_late_join_only_while_active() {
        let mut machine = machine();
        let late = Uuid::new_v4();
        assert_eq!(machine.join(late), Ok(JoinOutcome::Lobby));

        let mut machine = running();
        assert_eq!(machine.join(late), Err(PhaseError::GameInProgress));

        machine.activate().unwrap();
        assert_eq!(machine.join(late), Ok(JoinOutcome::Joined));
        assert_eq!(machine.join(late), Ok(JoinOutcome::AlreadyJoined));
        assert_eq!(machine.roster_size(), 3);

        assert!(machine.leave(late));
        assert!(!machine.leave(late));
    }

    #[test]
    fn test_join_rejected_when_full() {
        let mut machine = PhaseMachine::new(&SessionSettings {
            max_participants: 2,
            ..SessionSettings::default()
        });
        machine.begin([Uuid::new_v4(), Uuid::new_v4()]).unwrap();
        machine.activate().unwrap();
        assert_eq!(machine.join(Uuid::new_v4()), Err(PhaseError::GameInProgress));
    }
}
