//! Friendly image names
//!
//! Generates `predicate-object` names such as `brave-lantern` for builds that
//! were not given an explicit image name.

use rand::seq::SliceRandom;
use rand::Rng;

const PREDICATES: &[&str] = &[
    "amber", "ancient", "bold", "brave", "bright", "calm", "clever", "cosmic", "crimson", "curious",
    "daring", "eager", "fancy", "gentle", "golden", "happy", "hidden", "humble", "jolly", "keen",
    "lively", "lucky", "mellow", "misty", "nimble", "noble", "patient", "proud", "quiet", "rapid",
    "rustic", "shiny", "silent", "snowy", "steady", "swift", "tidy", "vivid", "witty", "zesty",
];

const OBJECTS: &[&str] = &[
    "anchor", "badger", "beacon", "canyon", "comet", "compass", "falcon", "fern", "forest",
    "glacier", "harbor", "heron", "island", "kettle", "lantern", "maple", "meadow", "meteor",
    "otter", "pebble", "pine", "prairie", "quartz", "raven", "river", "saddle", "spruce", "summit",
    "thistle", "tiger", "tundra", "valley", "walrus", "willow", "zephyr",
];

/// Generate a two word name joined by `-`
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

/// Generate a name from a caller-supplied RNG
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    // Both lists are non-empty constants
    let predicate = PREDICATES.choose(rng).copied().unwrap_or("quiet");
    let object = OBJECTS.choose(rng).copied().unwrap_or("otter");
    format!("{}-{}", predicate, object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_two_words() {
        let name = generate();
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 2);
        assert!(PREDICATES.contains(&parts[0]));
        assert!(OBJECTS.contains(&parts[1]));
    }

    #[test]
    fn test_generate_is_seed_deterministic() {
        let a = generate_with(&mut StdRng::seed_from_u64(7));
        let b = generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_names_are_valid_repository_names() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let name = generate_with(&mut rng);
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '-'));
        }
    }
}
