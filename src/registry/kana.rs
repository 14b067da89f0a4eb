//! Romaji and katakana to hiragana, used by the `kana` builtin.
//!
//! Conversion is strict: the result is returned only when every character of the converted text is
//! hiragana (or the long-vowel mark). Romaji is read case-insensitively.

use wana_kana::{ConvertJapanese, IsJapaneseStr};

/// Converts `input` to hiragana, or returns `None` when some part of it has no hiragana form.
pub fn to_hiragana(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    let hiragana = input.to_hiragana();
    hiragana.as_str().is_hiragana().then_some(hiragana)
}
