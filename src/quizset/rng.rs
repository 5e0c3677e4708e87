//! Seeded randomness for quiz sets

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::storage::QuizSetKey;

/// String that fixes a set's content: `theme|difficulty|count|seed`.
///
/// `version` is left out so a new version of the same request can be
/// stored without changing what an older client was served.
pub fn seed_string(key: &QuizSetKey) -> String {
    format!("{}|{}|{}|{}", key.theme, key.difficulty, key.count, key.seed)
}

/// 32-bit mixing hash of `s`, widened to 64 bits with a second pass
pub fn hash_seed(s: &str) -> u64 {
    let mut h: u32 = 1_779_033_703 ^ s.chars().count() as u32;
    for c in s.chars() {
        h = (h ^ c as u32).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    let hi = avalanche(h);
    let lo = avalanche(hi ^ 0x9e37_79b9);
    ((hi as u64) << 32) | lo as u64
}

fn avalanche(mut h: u32) -> u32 {
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

/// Generator seeded from the set's key
pub fn rng_for(key: &QuizSetKey) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_seed(&seed_string(key)))
}
