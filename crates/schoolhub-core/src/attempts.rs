//! Attempt and retry rules.

use crate::error::SubmitError;
use crate::model::{Exercise, StudentProgress};

/// How many attempts a student has used and what that allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    max_attempts: u32,
    attempts_used: u32,
}

impl AttemptPolicy {
    /// `max_attempts` of `None` or `0` means one attempt.
    pub fn new(max_attempts: Option<u32>, attempts_used: u32) -> Self {
        Self {
            max_attempts: max_attempts.filter(|&n| n > 0).unwrap_or(1),
            attempts_used,
        }
    }

    /// Policy for `exercise` given the student's graded attempts.
    pub fn from_history(exercise: &Exercise, attempts: &[StudentProgress]) -> Self {
        let highest = attempts.iter().map(|a| a.attempt_number).max().unwrap_or(0);
        let used = highest.max(attempts.len() as u32);
        Self::new(Some(exercise.max_attempts()), used)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn can_retry(&self) -> bool {
        self.attempts_used < self.max_attempts
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts_used)
    }

    /// 1-based number the next submission will carry.
    pub fn next_attempt_number(&self) -> u32 {
        self.attempts_used + 1
    }

    /// Detailed answers stay hidden while retries remain, unless the attempt
    /// was perfect.
    pub fn can_view_details(&self, attempt: &StudentProgress) -> bool {
        self.remaining_attempts() == 0 || attempt.is_perfect()
    }

    pub fn ensure_can_submit(&self) -> Result<(), SubmitError> {
        if self.can_retry() {
            Ok(())
        } else {
            Err(SubmitError::AttemptsExhausted {
                max_attempts: self.max_attempts,
            })
        }
    }
}

/// Most recent attempt by attempt number.
pub fn latest_attempt(attempts: &[StudentProgress]) -> Option<&StudentProgress> {
    attempts.iter().max_by_key(|a| a.attempt_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn exercise_with_max(max: Option<u32>) -> Exercise {
        let mut exercise = fixtures::three_question_qcm();
        exercise.metadata.max_attempts = max;
        exercise
    }

    #[test]
    fn latest_is_highest_attempt_number() {
        let attempts = vec![
            fixtures::attempt(2, 80.0),
            fixtures::attempt(3, 50.0),
            fixtures::attempt(1, 20.0),
        ];
        assert_eq!(latest_attempt(&attempts).unwrap().attempt_number, 3);
        assert!(latest_attempt(&[]).is_none());
    }

    #[test]
    fn exhausted_after_max_attempts() {
        let exercise = exercise_with_max(Some(2));
        let attempts = vec![fixtures::attempt(1, 40.0), fixtures::attempt(2, 60.0)];
        let policy = AttemptPolicy::from_history(&exercise, &attempts);
        assert!(!policy.can_retry());
        assert_eq!(policy.remaining_attempts(), 0);
        assert!(policy.ensure_can_submit().is_err());
        assert!(policy.can_view_details(latest_attempt(&attempts).unwrap()));
    }

    #[test]
    fn perfect_attempt_shows_details_while_retries_remain() {
        let exercise = exercise_with_max(Some(3));
        let attempts = vec![fixtures::attempt(1, 100.0)];
        let policy = AttemptPolicy::from_history(&exercise, &attempts);
        assert!(policy.can_retry());
        assert_eq!(policy.remaining_attempts(), 2);
        assert!(policy.can_view_details(&attempts[0]));

        let imperfect = fixtures::attempt(1, 90.0);
        assert!(!policy.can_view_details(&imperfect));
    }

    #[test]
    fn unset_max_means_single_attempt() {
        let exercise = exercise_with_max(None);
        let fresh = AttemptPolicy::from_history(&exercise, &[]);
        assert!(fresh.can_retry());
        assert_eq!(fresh.remaining_attempts(), 1);
        assert_eq!(fresh.next_attempt_number(), 1);

        let used = AttemptPolicy::from_history(&exercise, &[fixtures::attempt(1, 10.0)]);
        assert_eq!(used.remaining_attempts(), 0);
        assert!(matches!(
            used.ensure_can_submit(),
            Err(SubmitError::AttemptsExhausted { max_attempts: 1 })
        ));
    }

    #[test]
    fn remaining_never_underflows() {
        let policy = AttemptPolicy::new(Some(2), 5);
        assert_eq!(policy.remaining_attempts(), 0);
        assert!(!policy.can_retry());
    }

    #[test]
    fn attempts_used_uses_highest_attempt_number() {
        let exercise = exercise_with_max(Some(5));
        let policy = AttemptPolicy::from_history(&exercise, &[fixtures::attempt(3, 50.0)]);
        assert_eq!(policy.attempts_used(), 3);
        assert_eq!(policy.next_attempt_number(), 4);
    }
}
