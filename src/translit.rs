//! Bulgarian to Latin transliteration, used to derive deterministic sound
//! file names from Cyrillic text.

fn latin(c: char) -> Option<&'static str> {
    let mapped = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sht",
        'ъ' => "a",
        'ь' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(mapped)
}

const VOWELS: [char; 8] = ['а', 'е', 'и', 'о', 'у', 'ъ', 'ю', 'я'];

/// Lowercase Latin transliteration; characters outside the alphabet pass through
pub fn to_latin(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .fold(String::with_capacity(text.len()), |mut out, c| {
            match latin(c) {
                Some(s) => out.push_str(s),
                None => out.push(c),
            }
            out
        })
}

fn single_lower(letter: &str) -> Option<char> {
    let mut chars = letter.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    c.to_lowercase().next()
}

pub fn is_vowel(letter: &str) -> bool {
    single_lower(letter).is_some_and(|c| VOWELS.contains(&c))
}

pub fn is_consonant(letter: &str) -> bool {
    single_lower(letter).is_some_and(|c| latin(c).is_some() && !VOWELS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_latin() {
        assert_eq!(to_latin("котка"), "kotka");
        assert_eq!(to_latin("Щъркел"), "shtarkel");
        assert_eq!(to_latin("ябълка"), "yabalka");
    }

    #[test]
    fn test_to_latin_passes_through_unknown() {
        assert_eq!(to_latin("ба-ба 1"), "ba-ba 1");
    }

    #[test]
    fn test_vowels_and_consonants() {
        assert!(is_vowel("А"));
        assert!(is_vowel("ю"));
        assert!(!is_vowel("Б"));
        assert!(is_consonant("Щ"));
        assert!(!is_consonant("О"));
        assert!(!is_consonant("Q"));
        assert!(!is_vowel("АБ"));
        assert!(!is_vowel(""));
    }
}
