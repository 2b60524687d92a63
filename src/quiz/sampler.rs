use rand::Rng;

/// Picks `count` distinct elements of `pool` in random order.
///
/// Returns the whole pool shuffled when `count` is at least the pool size,
/// and nothing when the pool is empty or `count` is not positive.
/// The pool itself is never touched, sampling works on a copy.
pub fn sample<T: Clone>(pool: &[T], count: i64) -> Vec<T> {
    sample_with_rng(pool, count, &mut rand::thread_rng())
}

pub fn sample_with_rng<T, R>(pool: &[T], count: i64, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if pool.is_empty() {
        log::warn!("sample: empty pool provided");
        return Vec::new();
    }
    if count <= 0 {
        log::warn!("sample: invalid count {}, returning empty", count);
        return Vec::new();
    }

    let (count, capped) = take_count(count, pool.len());
    if capped {
        log::warn!(
            "sample: requested more than available, returning all {}",
            pool.len()
        );
    }

    let mut shuffled = pool.to_vec();
    shuffle(&mut shuffled, rng);
    shuffled.truncate(count);
    shuffled
}

/// How many of `available` elements a positive `count` yields, and whether it asked for more.
/// Asking for exactly `available` is not capping.
fn take_count(count: i64, available: usize) -> (usize, bool) {
    match usize::try_from(count) {
        Ok(count) if count <= available => (count, false),
        _ => (available, true),
    }
}

/// Backward Fisher-Yates: every permutation is equally likely.
fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn pool() -> Vec<Question> {
        (1..=5)
            .map(|id| Question::new(id, &format!("Q{}", id), &["A", "B", "C", "D"], 0))
            .collect()
    }

    fn ids(questions: &[Question]) -> Vec<u32> {
        let mut ids = questions.iter().map(|q| q.id).collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[test]
    fn returns_requested_number_without_duplicates() {
        let pool = pool();
        for count in 1..5 {
            let picked = sample(&pool, count);
            assert_eq!(picked.len(), count as usize);

            let unique = picked.iter().map(|q| q.id).collect::<HashSet<_>>();
            assert_eq!(unique.len(), picked.len());
            assert!(picked.iter().all(|q| pool.contains(q)));
        }
    }

    #[test]
    fn returns_whole_pool_when_count_reaches_its_size() {
        let pool = pool();
        assert_eq!(ids(&sample(&pool, 5)), ids(&pool));
        assert_eq!(ids(&sample(&pool, 10)), ids(&pool));
        assert_eq!(ids(&sample(&pool, i64::MAX)), ids(&pool));
    }

    #[test]
    fn only_a_count_above_the_pool_size_is_capped() {
        assert_eq!(take_count(3, 5), (3, false));
        assert_eq!(take_count(5, 5), (5, false));
        assert_eq!(take_count(6, 5), (5, true));
        assert_eq!(take_count(i64::MAX, 5), (5, true));
    }

    #[test]
    fn empty_pool_or_non_positive_count_gives_nothing() {
        let empty: Vec<Question> = Vec::new();
        assert!(sample(&empty, 3).is_empty());
        assert!(sample(&pool(), 0).is_empty());
        assert!(sample(&pool(), -1).is_empty());
    }

    #[test]
    fn leaves_pool_untouched() {
        let pool = pool();
        let before = pool.clone();
        let _ = sample(&pool, 3);
        let _ = sample(&pool, 8);
        assert_eq!(pool, before);
    }

    #[test]
    fn every_element_is_picked_about_equally_often() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(7);
        let trials = 10_000;
        let mut seen: HashMap<u32, usize> = HashMap::new();

        for _ in 0..trials {
            for q in sample_with_rng(&pool, 2, &mut rng) {
                *seen.entry(q.id).or_default() += 1;
            }
        }

        // 2 of 5 picked per trial: 4000 expected per element
        assert_eq!(seen.len(), 5);
        for (id, hits) in seen {
            assert!((3600..=4400).contains(&hits), "id {} picked {} times", id, hits);
        }
    }

    #[test]
    fn every_permutation_is_about_equally_likely() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 60_000;
        let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();

        for _ in 0..trials {
            *seen.entry(sample_with_rng(&[1u8, 2, 3], 3, &mut rng)).or_default() += 1;
        }

        assert_eq!(seen.len(), 6);
        for (perm, hits) in seen {
            assert!((9_400..=10_600).contains(&hits), "{:?} seen {} times", perm, hits);
        }
    }
}
