use super::chunk::Chunk;

/// Control tokens emitted by the supported model families.
pub const DEFAULT_DELIMITERS: [&str; 7] = [
    "</s>",
    "<eos>",
    "<end_of_turn>",
    "<|im_end|>",
    "<|endoftext|>",
    "<|end_of_text|>",
    "<|begin_of_text|>",
];

pub const DEFAULT_CHUNK_THRESHOLD: usize = 30;

/// Set of literal control tokens removed from model output.
#[derive(Debug, Clone)]
pub struct DelimiterSet {
    tokens: Vec<String>,
}

impl Default for DelimiterSet {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl DelimiterSet {
    /// Default delimiters plus any model-specific stop tokens.
    pub fn new(extra: &[String]) -> Self {
        let mut tokens: Vec<String> = DEFAULT_DELIMITERS.iter().map(ToString::to_string).collect();
        for token in extra {
            if !token.is_empty() && !tokens.contains(token) {
                tokens.push(token.clone());
            }
        }
        Self { tokens }
    }

    /// Remove every delimiter occurrence until none remain.
    ///
    /// Repeats to a fixed point so removals that splice a new delimiter
    /// together (`<e<eos>os>`) are stripped too.
    pub fn strip(&self, input: &str) -> String {
        let mut text = input.to_string();
        loop {
            let before = text.len();
            for token in &self.tokens {
                if text.contains(token.as_str()) {
                    text = text.replace(token.as_str(), "");
                }
            }
            if text.len() == before {
                return text;
            }
        }
    }
}

fn ends_word(text: &str) -> bool {
    text.ends_with(|c: char| c.is_whitespace() || matches!(c, '.' | '!' | '?' | ',' | ';'))
}

fn ends_sentence(text: &str) -> bool {
    text.ends_with(|c: char| matches!(c, '.' | '!' | '?' | '\n'))
}

/// Coalesces raw sub-word fragments into sentence- or size-bounded chunks.
///
/// Raw text accumulates in a word buffer until it ends on a word boundary;
/// the stripped word is then moved to the sentence buffer, which is emitted
/// once it ends a sentence or grows past the threshold.
#[derive(Debug)]
pub struct TokenBuffer {
    delimiters: DelimiterSet,
    threshold: usize,
    word: String,
    sentence: String,
}

impl Default for TokenBuffer {
    fn default() -> Self {
        Self::new(DelimiterSet::default(), DEFAULT_CHUNK_THRESHOLD)
    }
}

impl TokenBuffer {
    pub fn new(delimiters: DelimiterSet, threshold: usize) -> Self {
        Self {
            delimiters,
            threshold: threshold.max(1),
            word: String::new(),
            sentence: String::new(),
        }
    }

    pub fn consume(&mut self, raw: &str) -> Vec<Chunk> {
        self.word.push_str(raw);
        if !ends_word(&self.word) {
            return Vec::new();
        }

        let word = std::mem::take(&mut self.word);
        self.sentence.push_str(&self.delimiters.strip(&word));

        let over_threshold = self.sentence.chars().count() > self.threshold;
        if self.sentence.is_empty() || !(ends_sentence(&self.sentence) || over_threshold) {
            return Vec::new();
        }

        vec![Chunk::text(std::mem::take(&mut self.sentence))]
    }

    /// Emit whatever remains at end of stream.
    pub fn flush(&mut self) -> Option<Chunk> {
        let word = std::mem::take(&mut self.word);
        let mut rest = std::mem::take(&mut self.sentence);
        rest.push_str(&word);
        let rest = self.delimiters.strip(&rest);
        (!rest.is_empty()).then(|| Chunk::text(rest))
    }
}
