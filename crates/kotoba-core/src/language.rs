use std::collections::HashMap;

/// Text processing and lookup interface for language implementations
pub trait LanguageProcessor: Send + Sync {
    /// Language identifier (ISO 639-1 code: "ja", "zh", "ko", etc.)
    fn language_code(&self) -> &str;

    /// Normalize text (Unicode normalization, whitespace, etc.)
    fn normalize(&self, text: &str) -> String;

    /// Break text into processable tokens
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Look up a token in the dictionary
    fn lookup(&self, token: &Token) -> Vec<LookupResult>;
}

#[derive(Debug, Clone)]
pub struct Token {
    pub surface: String,
    pub normalized: String,
    pub position: usize,
}

/// Language-agnostic view of one ranked dictionary hit
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub term: String,
    pub readings: Vec<String>,
    pub definitions: Vec<Definition>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub text: String,
    pub part_of_speech: Vec<String>,
    pub tags: Vec<String>,
}
