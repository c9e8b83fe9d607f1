pub mod augment;
pub mod deconjugator;
pub mod lexicon;
pub mod loader;
pub mod lookup;
pub mod processor;
pub mod ranker;
pub mod restrict;
pub mod rules;
pub mod script;
pub mod segmenter;


pub use augment::{AudioIndex, FrequencyHit, FrequencyTable};
pub use deconjugator::{Hypothesis, deconjugate};
pub use lexicon::{EntryMatch, Lexicon, LexiconEntry};
pub use lookup::Definitions;
pub use processor::JapaneseAnalyzer;
pub use ranker::{PriorityRule, PriorityTable};
pub use rules::RuleSet;
pub use segmenter::{FuriganaPlacement, TextAnalysis, TextUnit};
