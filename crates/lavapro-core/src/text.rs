//! Text folding for label matching and search.
//!
//! Labels arrive from several dashboard generations ("Em Preparação",
//! "in-progress", "IN_PROGRESS"), so every comparison goes through [`fold`].

/// Lowercases, strips Portuguese diacritics and collapses `-`, `_` and
/// whitespace runs into single spaces.
///
/// ```rust
/// use lavapro_core::text::fold;
///
/// assert_eq!(fold("  Em Preparação "), "em preparacao");
/// assert_eq!(fold("IN_PROGRESS"), "in progress");
/// ```
pub fn fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(strip_accent(ch));
    }

    out
}

fn strip_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_collapses_separators() {
        assert_eq!(fold("out_for-delivery"), "out for delivery");
        assert_eq!(fold("a   b"), "a b");
        assert_eq!(fold("__x__"), "x");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn test_fold_strips_diacritics() {
        assert_eq!(fold("Em Trânsito"), "em transito");
        assert_eq!(fold("FUNCIONÁRIO"), "funcionario");
        assert_eq!(fold("Proprietário"), "proprietario");
    }
}
