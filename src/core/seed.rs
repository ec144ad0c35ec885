/// Seed codec — human-readable seeds, stepping, and numeric decoding.
///
/// A canonical seed is a vocabulary word followed by a number, e.g.
/// `otter42`. Canonical seeds form a cycle: stepping forward advances the
/// word and carries into the number, wrapping at both ends. Any other text
/// is a free-form seed; free-form states form a second cycle whose members
/// are written `#<state>`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Sorted, so lookups can binary search.
pub const VOCABULARY: [&str; 128] = [
    "acorn", "amber", "anchor", "apple", "arrow", "aspen", "aurora", "autumn", "badge",
    "badger", "bamboo", "basil", "beacon", "birch", "bison", "blossom", "bramble", "breeze",
    "brook", "cactus", "candle", "canyon", "cedar", "cherry", "cinder", "clover", "cobalt",
    "comet", "coral", "cricket", "crystal", "cypress", "dahlia", "daisy", "delta", "dove",
    "dune", "eagle", "elm", "ember", "falcon", "fern", "fig", "finch", "fjord", "flint", "fox",
    "frost", "garnet", "ginger", "glacier", "granite", "harbor", "hazel", "heron", "hollow",
    "honey", "iris", "island", "ivy", "jade", "jasmine", "juniper", "kelp", "kestrel", "kite",
    "lagoon", "lark", "laurel", "lemon", "lily", "lotus", "lynx", "maple", "marble", "meadow",
    "mint", "moss", "nectar", "nutmeg", "oak", "oasis", "olive", "onyx", "orchid", "otter",
    "pearl", "pebble", "pepper", "pine", "plum", "poppy", "quail", "quartz", "quill", "raven",
    "reed", "river", "robin", "rose", "saffron", "sage", "salmon", "sparrow", "spruce", "storm",
    "sunset", "swan", "thistle", "thyme", "tide", "tiger", "topaz", "tulip", "tundra", "umber",
    "valley", "velvet", "violet", "walnut", "willow", "wolf", "wren", "yarrow", "yew", "zebra",
    "zephyr", "zinnia",
];

/// Exclusive upper bound of the numeric suffix.
pub const SUFFIX_RANGE: u64 = 10_000;

/// Number of distinct canonical seeds. Canonical states are `0..CANONICAL_SPACE`.
pub const CANONICAL_SPACE: u64 = VOCABULARY.len() as u64 * SUFFIX_RANGE;

/// Number of free-form states. They occupy `CANONICAL_SPACE..u64::MAX`.
pub const FREE_FORM_SPACE: u64 = u64::MAX - CANONICAL_SPACE;

/// Marks the written form of a free-form state, e.g. `#1280007`.
pub const FREE_FORM_PREFIX: char = '#';

/// A human-readable seed.
///
/// Two seeds are equal when they decode to the same numeric state, so
/// `Otter042` and `otter42` are the same seed. Text that is not a
/// canonical seed is hashed into the states above `CANONICAL_SPACE`;
/// distinct free-form texts may collide there. `#<state>` names a
/// free-form state directly, so `hello` equals `#153251464478191497`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Seed {
    text: String,
    state: u64,
}

impl Seed {
    /// The seed for a state: `<word><number>` inside the canonical space,
    /// `#<state>` above it. `u64::MAX` is not a state and wraps to the first
    /// free-form state.
    pub fn from_state(state: u64) -> Seed {
        if state >= CANONICAL_SPACE {
            let state = if state == u64::MAX { CANONICAL_SPACE } else { state };
            return Seed {
                text: format!("{}{}", FREE_FORM_PREFIX, state),
                state,
            };
        }
        let word = VOCABULARY[(state % VOCABULARY.len() as u64) as usize];
        let number = state / VOCABULARY.len() as u64;
        Seed {
            text: format!("{}{}", word, number),
            state,
        }
    }

    /// Numeric state fed to the draw source.
    pub fn state(&self) -> u64 {
        self.state
    }

    /// The text as given.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_canonical(&self) -> bool {
        self.state < CANONICAL_SPACE
    }
}

/// Decode seed text to its numeric state.
pub fn decode(text: &str) -> u64 {
    let text = text.trim();
    canonical_state(text)
        .or_else(|| free_form_state(text))
        .unwrap_or_else(|| CANONICAL_SPACE + seahash::hash(text.as_bytes()) % FREE_FORM_SPACE)
}

fn free_form_state(text: &str) -> Option<u64> {
    let digits = text.strip_prefix(FREE_FORM_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let state: u64 = digits.parse().ok()?;
    (CANONICAL_SPACE..u64::MAX).contains(&state).then_some(state)
}

fn canonical_state(text: &str) -> Option<u64> {
    let split = text.find(|c: char| c.is_ascii_digit())?;
    let (word, digits) = text.split_at(split);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u64 = digits.parse().ok()?;
    if number >= SUFFIX_RANGE {
        return None;
    }
    let index = VOCABULARY
        .binary_search(&word.to_ascii_lowercase().as_str())
        .ok()?;
    Some(number * VOCABULARY.len() as u64 + index as u64)
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        let state = decode(&text);
        Seed { text, state }
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Seed::from(text.to_string())
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        seed.text
    }
}

impl FromStr for Seed {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Seed::from(s))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Eq for Seed {}

impl Hash for Seed {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
    }
}

/// A uniformly random canonical seed.
pub fn random_text_seed() -> Seed {
    random_text_seed_with(&mut rand::thread_rng())
}

pub fn random_text_seed_with<R: Rng + ?Sized>(rng: &mut R) -> Seed {
    Seed::from_state(rng.gen_range(0..CANONICAL_SPACE))
}

/// The seed after `seed`, within its own cycle.
pub fn next_text_seed(seed: &Seed) -> Seed {
    Seed::from_state(step(seed.state, true))
}

/// The seed before `seed`, within its own cycle.
pub fn prev_text_seed(seed: &Seed) -> Seed {
    Seed::from_state(step(seed.state, false))
}

fn step(state: u64, forward: bool) -> u64 {
    let (start, len) = if state < CANONICAL_SPACE {
        (0, CANONICAL_SPACE)
    } else {
        (CANONICAL_SPACE, FREE_FORM_SPACE)
    };
    let offset = state - start;
    let offset = if forward {
        (offset + 1) % len
    } else if offset == 0 {
        len - 1
    } else {
        offset - 1
    };
    start + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn vocabulary_sorted_and_unique() {
        for pair in VOCABULARY.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        assert!(VOCABULARY
            .iter()
            .all(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_lowercase())));
    }

    #[test]
    fn canonical_decoding() {
        assert_eq!(Seed::from("acorn0").state(), 0);
        assert_eq!(Seed::from("amber0").state(), 1);
        assert_eq!(Seed::from("acorn1").state(), 128);
        assert_eq!(Seed::from("zinnia9999").state(), CANONICAL_SPACE - 1);
        assert!(Seed::from("otter42").is_canonical());
    }

    #[test]
    fn from_state_round_trip() {
        for state in [0, 1, 127, 128, 4242, CANONICAL_SPACE - 1] {
            let seed = Seed::from_state(state);
            assert_eq!(seed.state(), state);
            assert_eq!(Seed::from(seed.as_str()), seed);
        }
        assert_eq!(Seed::from_state(3).as_str(), "apple0");
    }

    #[test]
    fn spelling_variants_are_equal() {
        assert_eq!(Seed::from("Otter042"), Seed::from("otter42"));
        assert_eq!(Seed::from(" otter42 "), Seed::from("otter42"));
    }

    #[test]
    fn free_form_seeds() {
        let a = Seed::from("hello world");
        let b = Seed::from("hello world");
        let c = Seed::from("hello worlds");
        assert!(!a.is_canonical());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!Seed::from("otter10000").is_canonical());
        assert!(!Seed::from("unknownword5").is_canonical());
        assert!(!Seed::from("otter4x2").is_canonical());
        assert!(!Seed::from("").is_canonical());
    }

    #[test]
    fn stepping_carries_into_number() {
        assert_eq!(next_text_seed(&Seed::from("acorn0")).as_str(), "amber0");
        assert_eq!(next_text_seed(&Seed::from("zinnia0")).as_str(), "acorn1");
        assert_eq!(prev_text_seed(&Seed::from("acorn1")).as_str(), "zinnia0");
    }

    #[test]
    fn stepping_wraps_at_both_ends() {
        assert_eq!(next_text_seed(&Seed::from("zinnia9999")).as_str(), "acorn0");
        assert_eq!(prev_text_seed(&Seed::from("acorn0")).as_str(), "zinnia9999");
    }

    #[test]
    fn stepping_inverse_laws() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let s = random_text_seed_with(&mut rng);
            assert_eq!(prev_text_seed(&next_text_seed(&s)), s);
            assert_eq!(next_text_seed(&prev_text_seed(&s)), s);
        }
    }

    #[test]
    fn free_form_stepping_inverse_laws() {
        for text in ["hello", "my favourite seed", "otter10000", ""] {
            let s = Seed::from(text);
            assert!(!s.is_canonical());
            assert_eq!(prev_text_seed(&next_text_seed(&s)), s, "{:?}", text);
            assert_eq!(next_text_seed(&prev_text_seed(&s)), s, "{:?}", text);
        }
    }

    #[test]
    fn free_form_steps_stay_free_form() {
        let hello = Seed::from("hello");
        assert_eq!(hello.state(), 153_251_464_478_191_497);
        let next = next_text_seed(&hello);
        assert!(!next.is_canonical());
        assert_eq!(next.as_str(), "#153251464478191498");
        assert_eq!(next.state(), hello.state() + 1);
        assert_eq!(Seed::from(next.as_str()), next);
        assert_eq!(prev_text_seed(&next).as_str(), "#153251464478191497");
    }

    #[test]
    fn free_form_cycle_wraps_at_both_ends() {
        let first = Seed::from_state(CANONICAL_SPACE);
        let last = Seed::from_state(u64::MAX - 1);
        assert_eq!(first.as_str(), "#1280000");
        assert_eq!(next_text_seed(&last), first);
        assert_eq!(prev_text_seed(&first), last);
        assert_eq!(Seed::from_state(u64::MAX), first);
    }

    #[test]
    fn written_free_form_states() {
        assert_eq!(Seed::from("#1280007").state(), CANONICAL_SPACE + 7);
        // Below the free-form range or malformed: hashed like any other text.
        assert_ne!(Seed::from("#42").state(), 42);
        assert!(!Seed::from("#42").is_canonical());
        assert_ne!(Seed::from("#").state(), CANONICAL_SPACE);
        assert_ne!(Seed::from(format!("#{}", u64::MAX)).state(), u64::MAX);
    }

    #[test]
    fn random_seeds_are_canonical_and_varied() {
        let mut rng = StdRng::seed_from_u64(1);
        let seeds: Vec<Seed> = (0..50).map(|_| random_text_seed_with(&mut rng)).collect();
        assert!(seeds.iter().all(Seed::is_canonical));
        let distinct: std::collections::HashSet<&Seed> = seeds.iter().collect();
        assert!(distinct.len() > 45);
        assert!(random_text_seed().is_canonical());
    }

    #[test]
    fn serde_as_string() {
        let seed = Seed::from("otter42");
        let encoded = ron::to_string(&seed).unwrap();
        assert_eq!(encoded, "\"otter42\"");
        let decoded: Seed = ron::from_str(&encoded).unwrap();
        assert_eq!(decoded, seed);
    }
}
