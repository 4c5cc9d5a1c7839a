use crate::model::progress::{ProgressDelta, rounded_percent};

/// Feedback tier shown when an exam finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every answer was correct.
    Perfect,
    /// At least 80%.
    Great,
    /// At least 60%.
    Fair,
    NeedsReview,
}

impl Verdict {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Verdict::Perfect => "Perfect score!",
            Verdict::Great => "Great job!",
            Verdict::Fair => "Not bad, keep practicing.",
            Verdict::NeedsReview => "Review the material and try again.",
        }
    }
}

/// Final result of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    correct: u32,
    total: u32,
}

impl Score {
    /// Builds a score, clamping `correct` to `total`.
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self {
            correct: correct.min(total),
            total,
        }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Percentage rounded to the nearest integer. Display only.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        rounded_percent(u64::from(self.correct), u64::from(self.total))
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let correct = u64::from(self.correct) * 100;
        let total = u64::from(self.total);
        if self.total > 0 && self.correct == self.total {
            Verdict::Perfect
        } else if correct >= total * 80 {
            Verdict::Great
        } else if correct >= total * 60 {
            Verdict::Fair
        } else {
            Verdict::NeedsReview
        }
    }

    /// Exact counts to merge into the study progress.
    #[must_use]
    pub fn delta(&self) -> ProgressDelta {
        // `new` keeps correct <= total.
        ProgressDelta::new(self.correct, self.total).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(Score::new(5, 5).percentage(), 100);
        assert_eq!(Score::new(2, 3).percentage(), 67);
        assert_eq!(Score::new(1, 3).percentage(), 33);
        assert_eq!(Score::new(0, 10).percentage(), 0);
    }

    #[test]
    fn verdict_tiers() {
        assert_eq!(Score::new(10, 10).verdict(), Verdict::Perfect);
        assert_eq!(Score::new(8, 10).verdict(), Verdict::Great);
        assert_eq!(Score::new(6, 10).verdict(), Verdict::Fair);
        assert_eq!(Score::new(5, 10).verdict(), Verdict::NeedsReview);
        // 79.9% stays below the 80% tier
        assert_eq!(Score::new(799, 1000).verdict(), Verdict::Fair);
        assert_eq!(Verdict::Perfect.message(), "Perfect score!");
    }

    #[test]
    fn delta_carries_exact_counts() {
        let delta = Score::new(4, 7).delta();
        assert_eq!(delta.correct(), 4);
        assert_eq!(delta.total(), 7);
        assert_eq!(delta.wrong(), 3);
    }
}
