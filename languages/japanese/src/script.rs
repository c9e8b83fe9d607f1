//! Character-class tests and script conversions for Japanese text.

/// Hiragana block, including the iteration marks ゝ/ゞ
pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{3096}' | '\u{309D}'..='\u{309E}')
}

/// Katakana block, including the iteration marks ヽ/ヾ
pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A0}'..='\u{30F6}' | '\u{30FD}'..='\u{30FE}')
}

/// True when every character is hiragana or katakana
pub fn is_kana(text: &str) -> bool {
    text.chars().all(|c| is_hiragana(c) || is_katakana(c))
}

const KANA_BLOCK_OFFSET: u32 = 0x30A0 - 0x3040;

pub fn hiragana_to_katakana(text: &str) -> String {
    text.chars()
        .map(|c| {
            if is_hiragana(c) {
                char::from_u32(c as u32 + KANA_BLOCK_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| {
            if is_katakana(c) {
                char::from_u32(c as u32 - KANA_BLOCK_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Fold the full-width ASCII block (U+FF01..=U+FF5E) and the ideographic
/// space down to their half-width equivalents; everything else passes
/// through unchanged.
pub fn to_halfwidth(text: &str) -> String {
    text.chars().map(halfwidth_char).collect()
}

fn halfwidth_char(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        _ => c,
    }
}

/// Sentence punctuation in either width, used to bound lookup windows and
/// to split text into lookup units.
pub fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        ' ' | '.'
            | '?'
            | '!'
            | ','
            | ';'
            | ':'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '⟨'
            | '⟩'
            | '‘'
            | '’'
            | '“'
            | '”'
            | '"'
            | '/'
            | '\\'
            | '（'
            | '）'
            | '｛'
            | '｝'
            | '［'
            | '］'
            | '【'
            | '】'
            | '、'
            | '，'
            | '゠'
            | '＝'
            | '…'
            | '‥'
            | '。'
            | '〽'
            | '「'
            | '」'
            | '『'
            | '』'
            | '〝'
            | '〟'
            | '〜'
            | '：'
            | '！'
            | '？'
            | '♪'
            | '\r'
            | '\n'
    )
}

/// ASCII or full-width decimal digit
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '０'..='９')
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}
