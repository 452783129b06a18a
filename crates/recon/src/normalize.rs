/// Comparison key for an entity name. Never shown to a user.
///
/// Lowercases, then keeps only alphanumeric characters, which drops
/// whitespace and punctuation. Letters outside ASCII (`ş`, `ğ`, `é`) are
/// kept as they are; combining marks are dropped, so `İ` folds to `i`.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_whitespace_insensitive() {
        assert_eq!(normalize("Huzurevi"), normalize("  huzur evi "));
        assert_eq!(normalize("Huzurevi"), "huzurevi");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(normalize("Aşçı (Baş)"), "aşçıbaş");
        assert_eq!(normalize("Bulaşıkçı - Yardımcı."), "bulaşıkçıyardımcı");
    }

    #[test]
    fn keeps_diacritics() {
        assert_eq!(normalize("Öğle Yemeği"), "öğleyemeği");
        assert_ne!(normalize("Asci"), normalize("Aşçı"));
        assert_eq!(normalize("Café"), "café");
    }

    #[test]
    fn dotted_capital_i_folds_to_plain_i() {
        assert_eq!(normalize("İstanbul"), normalize("istanbul"));
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(normalize("Blok 2"), "blok2");
        assert_ne!(normalize("Blok 2"), normalize("Blok 3"));
    }

    #[test]
    fn empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" -- "), "");
    }
}
