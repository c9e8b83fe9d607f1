use unicode_normalization::UnicodeNormalization;

pub trait Preprocessor {
    // Default preprocessor for pasted/captured text
    fn process(&self, text: &str) -> String {
        let text = text.trim();

        if text.is_empty() {
            return String::new();
        }

        // NFC, not NFKC: the engines fold character widths themselves and
        // need the original full-width forms intact
        text.nfc()
            .filter(|&c| !matches!(c, '\n' | '\r' | '\u{200B}' | '\u{200C}' | '\u{FEFF}'))
            .collect()
    }
}

pub struct DefaultPreprocessor;
impl Preprocessor for DefaultPreprocessor {}
