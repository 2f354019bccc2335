//! Text clean-up for the matrix font
//!
//! The 5x8 font only covers ASCII, so accented letters from French feeds
//! are folded to their base letter before display.

use alloc::string::String;

/// Words dropped when shortening dish names
const STOP_WORDS: &[&str] = &[
    "aux", "de", "et", "avec", "à", "le", "la", "du", "des", "en", "au", "sur", "pour", "les",
    "un", "une", "deux", "trois", "quatre", "d'", "l'", "with", "and", "of", "in", "for", "the",
    "to", "on", "at", "from", "by", "an", "a", "one", "two", "three", "four", "fresh",
    "old fashioned", "organic", "mature", "traditional", "natural", "style", "sliced", "drenched",
];

/// Replace French accented letters, ligatures and curly apostrophes with ASCII
pub fn fold_french(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'à'..='å' => out.push('a'),
            'ç' => out.push('c'),
            'è'..='ë' => out.push('e'),
            'ì'..='ï' => out.push('i'),
            'ò'..='ö' => out.push('o'),
            'ù'..='ü' => out.push('u'),
            'ÿ' => out.push('y'),
            'À'..='Å' => out.push('A'),
            'Ç' => out.push('C'),
            'È'..='Ë' => out.push('E'),
            'Ì'..='Ï' => out.push('I'),
            'Ò'..='Ö' => out.push('O'),
            'Ù'..='Ü' => out.push('U'),
            'Ÿ' => out.push('Y'),
            'Œ' => out.push_str("OE"),
            'œ' => out.push_str("oe"),
            '’' => out.push('\''),
            other => out.push(other),
        }
    }
    out
}

/// Keep the first `max_words` meaningful words of `dish`
///
/// Punctuation is stripped, `/` and `-` split compounds, and stop words
/// (articles, prepositions, filler adjectives) are skipped.
pub fn key_words(dish: &str, max_words: usize) -> String {
    let mut out = String::new();
    let mut found = 0;
    for raw in dish.split(' ') {
        if found >= max_words {
            break;
        }
        let word = clean_word(raw.trim());
        let word = word.trim();
        if word.is_empty() || is_stop_word(word) {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        found += 1;
    }
    out
}

fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| !",.;&:()+[]*$#{}@".contains(*c))
        .map(|c| if c == '/' || c == '-' { ' ' } else { c })
        .collect()
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.iter().any(|stop| stop.to_lowercase() == word.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_french() {
        assert_eq!(fold_french("Crème brûlée"), "Creme brulee");
        assert_eq!(fold_french("Œuf cocotte, bœuf"), "OEuf cocotte, boeuf");
        assert_eq!(fold_french("l’entrée"), "l'entree");
        assert_eq!(fold_french("ÀÉÎÔÙÇ"), "AEIOUC");
        assert_eq!(fold_french("plain ascii 123"), "plain ascii 123");
    }

    #[test]
    fn test_fold_leaves_other_scripts() {
        assert_eq!(fold_french("ß→€"), "ß→€");
    }

    #[test]
    fn test_key_words_skips_stop_words() {
        assert_eq!(
            key_words("Filet of fresh salmon with lemon butter and rice", 4),
            "Filet salmon lemon butter"
        );
        assert_eq!(key_words("Le poulet aux herbes", 4), "poulet herbes");
    }

    #[test]
    fn test_key_words_strips_punctuation() {
        assert_eq!(key_words("Pasta (vegan), tomato; basil!", 4), "Pasta vegan tomato basil!");
        assert_eq!(key_words("Old-fashioned beef stew", 4), "beef stew");
        assert_eq!(key_words("Chili con/sin carne", 4), "Chili con sin carne");
    }

    #[test]
    fn test_key_words_limit_and_empty() {
        assert_eq!(key_words("one two three four", 4), "");
        assert_eq!(key_words("alpha beta gamma delta epsilon", 2), "alpha beta");
        assert_eq!(key_words("", 4), "");
        assert_eq!(key_words("  spaced   out  ", 4), "spaced out");
    }
}
