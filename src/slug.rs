// src/slug.rs
//
// URL slugs for article titles. Kana are romanized and Latin letters lose
// their accents first, so Japanese and European titles yield readable ASCII.

use deunicode::deunicode_char;
use wana_kana::ConvertJapanese;

/// Symbols spelled out as words rather than dropped.
fn symbol_word(ch: char) -> Option<&'static str> {
    Some(match ch {
        '&' => "and",
        '|' => "or",
        '<' => "less",
        '>' => "greater",
        '%' => "percent",
        '$' => "dollar",
        '¢' => "cent",
        '£' => "pound",
        '¥' => "yen",
        '€' => "euro",
        _ => return None,
    })
}

fn is_latin_letter(ch: char) -> bool {
    matches!(ch, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}') && ch.is_alphabetic()
}

/// Lower-case ASCII slug of `input`.
///
/// Kana become romaji, accented Latin letters are transliterated and a few
/// symbols become words (`&` is `and`). Any other character that is not an
/// ASCII letter, digit or whitespace is deleted. Whitespace and `-` runs turn
/// into a single `-`, with none at either end.
pub fn to_slug(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let romaji = input.to_romaji();

    let mut spelled = String::with_capacity(romaji.len());
    for ch in romaji.chars() {
        if ch == '-' {
            spelled.push(' ');
        } else if let Some(word) = symbol_word(ch) {
            spelled.push_str(word);
        } else if is_latin_letter(ch) {
            spelled.push_str(deunicode_char(ch).unwrap_or(""));
        } else {
            spelled.push(ch);
        }
    }

    spelled
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || ch.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
