//! Round configuration and round state.
//!
//! A round is an ordered list of phases plus a time limit. The config is
//! either supplied by the caller (validated) or generated: 2–4 phases
//! alternating from [`Mode::Picking`], with 15–45 seconds drawn per phase.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::generation::{
    MAX_PHASES, MAX_PHASE_SECONDS, MIN_PHASES, MIN_PHASE_SECONDS, ROUND_ID_RANGE,
};

/// Phase mode. Decides which commands are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Picking,
    Inbound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub id: String,
    pub phases: Vec<Mode>,
    /// Seconds for the whole round.
    pub time_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundConfigError {
    #[error("round {0} has no phases")]
    NoPhases(String),
    #[error("round {0} has a zero time limit")]
    ZeroTimeLimit(String),
}

impl RoundConfig {
    pub fn new(id: impl Into<String>, phases: Vec<Mode>, time_limit: u32) -> Self {
        Self {
            id: id.into(),
            phases,
            time_limit,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), RoundConfigError> {
        if self.phases.is_empty() {
            return Err(RoundConfigError::NoPhases(self.id.clone()));
        }
        if self.time_limit == 0 {
            return Err(RoundConfigError::ZeroTimeLimit(self.id.clone()));
        }
        Ok(())
    }
}

/// Random round: alternating phases starting with picking, one time draw per
/// phase summed into the limit.
pub fn generate_round_config(rng: &mut impl Rng) -> RoundConfig {
    let count = rng.gen_range(MIN_PHASES..=MAX_PHASES);
    let phases: Vec<Mode> = (0..count)
        .map(|i| if i % 2 == 0 { Mode::Picking } else { Mode::Inbound })
        .collect();
    let time_limit = (0..count)
        .map(|_| rng.gen_range(MIN_PHASE_SECONDS..=MAX_PHASE_SECONDS))
        .sum();
    RoundConfig {
        id: format!("RND-{}", rng.gen_range(0..ROUND_ID_RANGE)),
        phases,
        time_limit,
    }
}

/// Progress of the round in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub config: RoundConfig,
    /// Only ever increases; equals `phases.len()` once finished.
    pub current_phase_index: usize,
    pub score: u32,
    pub is_finished: bool,
}

impl RoundState {
    pub fn new(config: RoundConfig) -> Self {
        Self {
            config,
            current_phase_index: 0,
            score: 0,
            is_finished: false,
        }
    }

    /// Mode of the active phase, `None` once the round is finished.
    pub fn current_phase(&self) -> Option<Mode> {
        self.config.phases.get(self.current_phase_index).copied()
    }

    /// Phases not yet completed, including the active one.
    pub fn phases_remaining(&self) -> usize {
        self.config
            .phases
            .len()
            .saturating_sub(self.current_phase_index)
    }

    /// Step to the next phase, finishing the round after the last one.
    /// Returns the mode of the new phase.
    pub(crate) fn advance(&mut self) -> Option<Mode> {
        if self.is_finished {
            return None;
        }
        self.current_phase_index += 1;
        let next = self.current_phase();
        if next.is_none() {
            self.is_finished = true;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_config_shape() {
        for seed in 0..100 {
            let config = generate_round_config(&mut StdRng::seed_from_u64(seed));
            let n = config.phases.len();
            assert!((MIN_PHASES..=MAX_PHASES).contains(&n));
            assert_eq!(config.phases[0], Mode::Picking);
            for pair in config.phases.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
            let n = n as u32;
            assert!(config.time_limit >= n * MIN_PHASE_SECONDS);
            assert!(config.time_limit <= n * MAX_PHASE_SECONDS);
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validate() {
        let empty = RoundConfig::new("r", vec![], 60);
        assert_eq!(empty.validate(), Err(RoundConfigError::NoPhases("r".into())));
        let no_time = RoundConfig::new("r", vec![Mode::Inbound], 0);
        assert_eq!(
            no_time.validate(),
            Err(RoundConfigError::ZeroTimeLimit("r".into()))
        );
    }

    #[test]
    fn test_config_json() {
        let json = r#"{"id":"warmup","phases":["PICKING","INBOUND"],"time_limit":90}"#;
        let config = RoundConfig::from_json(json).unwrap();
        assert_eq!(config.phases, vec![Mode::Picking, Mode::Inbound]);
        assert_eq!(config.time_limit, 90);
    }

    #[test]
    fn test_advance_finishes_once() {
        let mut state = RoundState::new(RoundConfig::new("r", vec![Mode::Picking, Mode::Inbound], 60));
        assert_eq!(state.current_phase(), Some(Mode::Picking));
        assert_eq!(state.phases_remaining(), 2);
        assert_eq!(state.advance(), Some(Mode::Inbound));
        assert!(!state.is_finished);
        assert_eq!(state.advance(), None);
        assert!(state.is_finished);
        assert_eq!(state.current_phase_index, 2);
        assert_eq!(state.phases_remaining(), 0);
        assert_eq!(state.advance(), None);
        assert_eq!(state.current_phase_index, 2);
    }
}
