//! Text normalization shared by every extractor and scorer

use crate::error::Result;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Standard English stop-word list used when building term representations.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
    "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg",
    "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty",
    "found", "four", "from", "front", "full", "further", "get", "give", "go", "had", "has",
    "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred",
    "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself",
    "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
    "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
    "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus",
    "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
    token_regex: Regex,
    whitespace_regex: Regex,
}

#[derive(Debug, Clone)]
pub struct ProcessedText {
    pub cleaned: String,
    pub tokens: Vec<String>,
    pub sentences: Vec<String>,
    pub word_count: usize,
    pub character_count: usize,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        // Words of two or more word characters, the usual vectorizer token pattern
        let token_regex = Regex::new(r"(?u)\b\w\w+\b").expect("Invalid token regex");
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        Self {
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            token_regex,
            whitespace_regex,
        }
    }

    /// Lower-case text for keyword containment checks
    pub fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
    }

    /// Process text with cleaning, tokenization, and sentence splitting
    pub fn process(&self, text: &str) -> Result<ProcessedText> {
        let cleaned = self.clean_text(text);
        let tokens = self.tokenize(&cleaned);
        let sentences = self.split_sentences(&cleaned);

        Ok(ProcessedText {
            word_count: cleaned.unicode_words().count(),
            character_count: cleaned.chars().count(),
            cleaned,
            tokens,
            sentences,
        })
    }

    /// Collapse whitespace and fold typographic punctuation to ASCII
    pub fn clean_text(&self, text: &str) -> String {
        let folded: String = text
            .chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2026}' => '.',
                _ => c,
            })
            .collect();

        self.whitespace_regex.replace_all(&folded, " ").trim().to_string()
    }

    /// Lower-cased tokens of two or more word characters, stop words included
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = self.normalize(text);
        self.token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Tokens with stop words removed
    pub fn content_terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|t| !self.is_stop_word(t))
            .collect()
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Shorten text to at most `max_chars` characters on a word boundary
    pub fn preview(&self, text: &str, max_chars: usize) -> String {
        let cleaned = self.clean_text(text);
        if cleaned.chars().count() <= max_chars {
            return cleaned;
        }
        let cut: String = cleaned.chars().take(max_chars).collect();
        let boundary = cut.rfind(' ').unwrap_or(cut.len());
        format!("{}...", &cut[..boundary])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenization_matches_vectorizer_pattern() {
        let processor = TextProcessor::new();
        let tokens = processor.tokenize("Deep-Learning with C++ and R, in PyTorch!");

        assert_eq!(tokens, vec!["deep", "learning", "with", "and", "in", "pytorch"]);
    }

    #[test]
    fn test_content_terms_drop_stop_words() {
        let processor = TextProcessor::new();
        let terms = processor.content_terms("The analysis of neural networks is ongoing");

        assert!(terms.contains(&"analysis".to_string()));
        assert!(terms.contains(&"neural".to_string()));
        assert!(!terms.contains(&"the".to_string()));
        assert!(!terms.contains(&"of".to_string()));
        assert!(!terms.contains(&"is".to_string()));
    }

    #[test]
    fn test_text_cleaning() {
        let processor = TextProcessor::new();
        let cleaned = processor.clean_text("  Transfer\tlearning \u{2014} \u{201C}medical\u{201D}\n imaging ");

        assert_eq!(cleaned, "Transfer learning - \"medical\" imaging");
    }

    #[test]
    fn test_process_counts() {
        let processor = TextProcessor::new();
        let result = processor.process("Statistical analysis of X-rays. Clinical validation follows.").unwrap();

        assert_eq!(result.sentences.len(), 2);
        assert!(result.word_count >= 6);
        assert!(result.tokens.contains(&"statistical".to_string()));
    }

    #[test]
    fn test_preview_cuts_on_word_boundary() {
        let processor = TextProcessor::new();
        let preview = processor.preview("federated learning for hospital networks", 20);

        assert_eq!(preview, "federated learning...");
        assert_eq!(processor.preview("short", 20), "short");
    }
}
