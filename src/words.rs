//! Built-in word catalog.
//!
//! Categories and their word pools ship with the binary so a fresh store is
//! playable without any seeding step. Round setup rejects any category that
//! cannot fill a full grid, so every pool here must stay comfortably above
//! sixteen words.

/// Static catalog of (category name, word pool) pairs
pub const CATALOG: &[(&str, &[&str])] = &[
    (
        "Animals",
        &[
            "elephant",
            "giraffe",
            "penguin",
            "dolphin",
            "kangaroo",
            "octopus",
            "cheetah",
            "hedgehog",
            "flamingo",
            "raccoon",
            "walrus",
            "chameleon",
            "otter",
            "porcupine",
            "armadillo",
            "toucan",
            "lobster",
            "meerkat",
            "platypus",
            "wolverine",
        ],
    ),
    (
        "Food",
        &[
            "pizza",
            "sushi",
            "croissant",
            "burrito",
            "pancake",
            "lasagna",
            "dumpling",
            "waffle",
            "pretzel",
            "falafel",
            "ramen",
            "meatball",
            "omelette",
            "churro",
            "baguette",
            "risotto",
            "taco",
            "gnocchi",
            "donut",
            "paella",
        ],
    ),
    (
        "Sports",
        &[
            "soccer",
            "tennis",
            "archery",
            "curling",
            "fencing",
            "rowing",
            "badminton",
            "volleyball",
            "snowboarding",
            "judo",
            "cricket",
            "handball",
            "biathlon",
            "surfing",
            "darts",
            "bowling",
            "rugby",
            "gymnastics",
            "squash",
            "hurdles",
        ],
    ),
    (
        "Occupations",
        &[
            "plumber",
            "architect",
            "surgeon",
            "barista",
            "locksmith",
            "astronaut",
            "librarian",
            "electrician",
            "chef",
            "firefighter",
            "carpenter",
            "pharmacist",
            "pilot",
            "beekeeper",
            "tailor",
            "journalist",
            "lifeguard",
            "translator",
            "blacksmith",
            "optician",
        ],
    ),
    (
        "Countries",
        &[
            "Japan",
            "Brazil",
            "Iceland",
            "Morocco",
            "Canada",
            "Portugal",
            "Vietnam",
            "Kenya",
            "Norway",
            "Mexico",
            "Thailand",
            "Greece",
            "Australia",
            "Peru",
            "Finland",
            "Egypt",
            "India",
            "Chile",
            "Croatia",
            "Scotland",
        ],
    ),
    (
        "Instruments",
        &[
            "violin",
            "trumpet",
            "accordion",
            "harmonica",
            "cello",
            "bagpipes",
            "ukulele",
            "saxophone",
            "marimba",
            "banjo",
            "clarinet",
            "harp",
            "tambourine",
            "didgeridoo",
            "oboe",
            "triangle",
            "mandolin",
            "theremin",
            "tuba",
            "xylophone",
        ],
    ),
    (
        "Nature",
        &[
            "volcano",
            "glacier",
            "waterfall",
            "canyon",
            "meadow",
            "reef",
            "dune",
            "geyser",
            "fjord",
            "tundra",
            "swamp",
            "avalanche",
            "lagoon",
            "cliff",
            "rainforest",
            "iceberg",
            "cave",
            "delta",
            "prairie",
            "oasis",
        ],
    ),
    (
        "Transport",
        &[
            "bicycle",
            "submarine",
            "helicopter",
            "tram",
            "gondola",
            "scooter",
            "zeppelin",
            "ferry",
            "rickshaw",
            "snowmobile",
            "unicycle",
            "hovercraft",
            "limousine",
            "kayak",
            "skateboard",
            "monorail",
            "tractor",
            "ambulance",
            "funicular",
            "sled",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GRID_SIZE;
    use std::collections::HashSet;

    #[test]
    fn test_every_category_can_fill_a_grid() {
        for (name, words) in CATALOG {
            assert!(
                words.len() >= GRID_SIZE,
                "category {} has only {} words",
                name,
                words.len()
            );
        }
    }

    #[test]
    fn test_words_are_single_tokens() {
        for (_, words) in CATALOG {
            for word in *words {
                assert!(!word.trim().is_empty());
                assert!(
                    !word.contains(char::is_whitespace),
                    "word {:?} contains whitespace",
                    word
                );
            }
        }
    }

    #[test]
    fn test_no_duplicate_words_within_a_category() {
        for (name, words) in CATALOG {
            let mut seen = HashSet::new();
            for word in *words {
                assert!(
                    seen.insert(word.to_lowercase()),
                    "duplicate word {:?} in category {}",
                    word,
                    name
                );
            }
        }
    }
}
