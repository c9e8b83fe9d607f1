use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_data_dir() -> PathBuf {
    PathBuf::from("dict")
}

fn default_depth() -> usize {
    10
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory holding the dictionary/rule/frequency/audio data files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Result depth per lookup
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Extra lexicon files to load on top of the data directory
    #[serde(default)]
    pub additional_dicts: Vec<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            depth: default_depth(),
            additional_dicts: vec![],
        }
    }
}

impl AnalyzerConfig {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        let data_dir = env::var("KOTOBA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let depth = env::var("KOTOBA_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_depth);

        AnalyzerConfig { data_dir, depth, additional_dicts: vec![] }
    }
}
