/// Turn a title into a project name: lowercase ASCII, accents folded,
/// runs of anything else collapsed into single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        match fold_accent(c) {
            Some(c) if c.is_ascii_alphanumeric() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            }
            // Combining marks vanish like their base letter's accent
            None => {}
            Some(_) => pending_dash = true,
        }
    }

    slug
}

/// ASCII base letter of a Latin accented character. `None` for
/// combining diacritical marks.
fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{0300}'..='\u{036f}' => return None,
        other => other,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Projeto Demo"), "projeto-demo");
        assert_eq!(slugify("  Casa de Praia — Suíte #2 "), "casa-de-praia-suite-2");
        assert_eq!(slugify("Ação"), "acao");
        assert_eq!(slugify("Ac\u{0327}a\u{0303}o"), "acao");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify(""), "");
    }
}
