use super::Step;
use crate::service::JobId;
use serde::Serialize;

const PROGRESS_STEP: u8 = 10;
const PROGRESS_CEILING: u8 = 90;
const PROGRESS_DONE: u8 = 100;

/// Cosmetic progress shown while the service works.
///
/// Advances a fixed step per `processing` observation; it is not derived from
/// the server and only `complete` reaches 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedProgress(u8);

impl SimulatedProgress {
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn advance(&mut self) -> u8 {
        if self.0 < PROGRESS_CEILING {
            self.0 = (self.0 + PROGRESS_STEP).min(PROGRESS_CEILING);
        }
        self.0
    }

    pub fn complete(&mut self) -> u8 {
        self.0 = PROGRESS_DONE;
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub job_id: JobId,
    pub step: Step,
    pub is_processing: bool,
    pub progress: u8,
    pub selection_count: usize,
    pub busy: bool,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_in_fixed_steps_and_caps_below_done() {
        let mut progress = SimulatedProgress::default();
        let seen: Vec<u8> = (0..12).map(|_| progress.advance()).collect();

        assert_eq!(&seen[..3], &[10, 20, 30]);
        assert!(seen.iter().all(|value| *value <= PROGRESS_CEILING));
        assert_eq!(progress.value(), 90);
    }

    #[test]
    fn complete_jumps_to_done() {
        let mut progress = SimulatedProgress::default();
        progress.advance();
        assert_eq!(progress.complete(), 100);
    }
}
