//! Text normalization for matching sheet values typed by people.

/// Lowercase, strip Latin accents, collapse surrounding whitespace.
pub fn normalize(text: &str) -> String {
    text.trim().chars().flat_map(char::to_lowercase).map(fold_accent).collect()
}

/// Map an accented Latin letter onto its base letter.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Split normalized text into alphanumeric tokens.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}
