//! Random question selection for exams.

use rand::Rng;
use tracing::debug;

use radix_core::model::{DifficultyFilter, Question};

use crate::error::SessionError;

/// Number of questions drawn for an exam unless configured otherwise.
pub const DEFAULT_EXAM_SIZE: usize = 10;

/// Shuffles `items` in place so that every permutation is equally likely.
///
/// Each position `i` is swapped with a uniformly chosen position in `i..len`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    let len = items.len();
    for i in 0..len.saturating_sub(1) {
        let j = rng.random_range(i..len);
        items.swap(i, j);
    }
}

/// Draws up to `count` distinct questions matching `filter`, in random order.
///
/// # Errors
///
/// Returns `SessionError::EmptyPool` if no question passes the filter.
pub fn draw<R: Rng + ?Sized>(
    pool: &[Question],
    count: usize,
    filter: DifficultyFilter,
    rng: &mut R,
) -> Result<Vec<Question>, SessionError> {
    let mut eligible: Vec<Question> = pool.iter().filter(|q| filter.matches(q)).cloned().collect();
    if eligible.is_empty() {
        return Err(SessionError::EmptyPool);
    }

    shuffle(&mut eligible, rng);
    eligible.truncate(count);
    debug!(
        %filter,
        pool = pool.len(),
        drawn = eligible.len(),
        "drew exam questions"
    );
    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_core::model::{Category, Difficulty, QuestionDraft};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{HashMap, HashSet};

    fn question(id: usize, difficulty: Difficulty) -> Question {
        QuestionDraft {
            id: format!("q{id}"),
            prompt: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            explanation: String::new(),
            difficulty,
            category: Category::Concept,
        }
        .validate()
        .unwrap()
    }

    fn pool() -> Vec<Question> {
        (0..15)
            .map(|i| question(i, Difficulty::ALL[i / 5]))
            .collect()
    }

    #[test]
    fn filter_limits_draw_to_matching_tier() {
        let mut rng = StdRng::seed_from_u64(7);
        let drawn = draw(
            &pool(),
            10,
            DifficultyFilter::Only(Difficulty::Beginner),
            &mut rng,
        )
        .unwrap();
        assert_eq!(drawn.len(), 5);
        assert!(drawn.iter().all(|q| q.difficulty() == Difficulty::Beginner));
    }

    #[test]
    fn draw_caps_at_requested_count_without_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        let drawn = draw(&pool(), 10, DifficultyFilter::All, &mut rng).unwrap();
        assert_eq!(drawn.len(), 10);
        let ids: HashSet<_> = drawn.iter().map(Question::id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn empty_filter_result_is_an_error() {
        let beginners: Vec<_> = pool().into_iter().take(5).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let err = draw(
            &beginners,
            10,
            DifficultyFilter::Only(Difficulty::Advanced),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::EmptyPool));
    }

    #[test]
    fn same_seed_gives_same_draw() {
        let a = draw(&pool(), 5, DifficultyFilter::All, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = draw(&pool(), 5, DifficultyFilter::All, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn selection_frequency_is_uniform() {
        const TRIALS: usize = 20_000;
        const COUNT: usize = 5;
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut selected: HashMap<String, usize> = HashMap::new();
        let mut first: HashMap<String, usize> = HashMap::new();

        for _ in 0..TRIALS {
            let drawn = draw(&pool, COUNT, DifficultyFilter::All, &mut rng).unwrap();
            let unique: HashSet<_> = drawn.iter().map(Question::id).collect();
            assert_eq!(unique.len(), COUNT);
            for q in &drawn {
                *selected.entry(q.id().to_owned()).or_default() += 1;
            }
            *first.entry(drawn[0].id().to_owned()).or_default() += 1;
        }

        // Chi-square critical value for 14 degrees of freedom at p = 0.001.
        let critical = 36.12;
        let chi_square = |counts: &HashMap<String, usize>, expected: f64| -> f64 {
            pool.iter()
                .map(|q| {
                    let observed = counts.get(q.id()).copied().unwrap_or(0) as f64;
                    (observed - expected).powi(2) / expected
                })
                .sum()
        };

        let k = pool.len() as f64;
        let inclusion = chi_square(&selected, TRIALS as f64 * COUNT as f64 / k);
        let leading = chi_square(&first, TRIALS as f64 / k);
        assert!(inclusion < critical, "inclusion chi-square {inclusion}");
        assert!(leading < critical, "first-position chi-square {leading}");
    }

    #[test]
    fn shuffle_handles_tiny_slices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        shuffle(&mut empty, &mut rng);
        let mut one = vec![9];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![9]);
    }
}
