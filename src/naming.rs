//! Display rules applied to upstream identifiers.

pub const MEGA_MARKER: &str = "mega";
pub const REGIONAL_MARKERS: [&str; 4] = ["alola", "galar", "hisui", "paldea"];
pub const GENUS_CATEGORY_WORD: &str = "Pokémon";
pub const UNKNOWN_SPECIES: &str = "Unknown";

/// `mr-mime` -> `Mr Mime`, `charizard-mega-x` -> `Mega Charizard X`.
pub fn display_name(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('-').filter(|part| !part.is_empty()).collect();
    match parts.iter().position(|part| *part == MEGA_MARKER) {
        Some(index) if index > 0 => {
            let mut words = vec!["Mega".to_string()];
            words.extend(parts[..index].iter().map(|part| capitalize(part)));
            words.extend(parts[index + 1..].iter().map(|part| capitalize(part)));
            words.join(" ")
        }
        _ => parts
            .iter()
            .map(|part| capitalize(part))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Ability, move and item labels keep their case; only separators change.
pub fn display_label(raw: &str) -> String {
    raw.replace('-', " ")
}

pub fn species_label(genus: Option<&str>) -> String {
    match genus {
        Some(genus) => {
            // "Seed Pokémon" in English, "Samen-Pokémon" in German
            let base = genus
                .strip_suffix(GENUS_CATEGORY_WORD)
                .map(|rest| rest.trim_end_matches([' ', '-']))
                .unwrap_or(genus);
            base.trim().to_string()
        }
        None => UNKNOWN_SPECIES.to_string(),
    }
}

pub fn is_mega(raw: &str) -> bool {
    raw.split('-').skip(1).any(|part| part == MEGA_MARKER)
}

pub fn regional_marker(raw: &str) -> Option<&'static str> {
    let parts: Vec<&str> = raw.split('-').skip(1).collect();
    REGIONAL_MARKERS
        .iter()
        .copied()
        .find(|marker| parts.contains(marker))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
