//! Canonical species names for the leaderboard output

/// Legacy or ambiguous names mapped to their disambiguated forms
const CANONICAL_NAMES: &[(&str, &str)] = &[
    ("Nidoran\u{2640}", "Nidoran-F"),
    ("Nidoran\u{2642}", "Nidoran-M"),
    ("Deoxys", "Deoxys-M"),
    ("Giratina", "Giratina-A"),
    ("Shaymin", "Shaymin-L"),
    ("Wormadam", "Wormadam-P"),
];

/// Map a species name to its canonical form, returning it unchanged if it
/// is not one of the known ambiguous names
pub fn normalize(name: &str) -> &str {
    CANONICAL_NAMES
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map_or(name, |&(_, canonical)| canonical)
}
