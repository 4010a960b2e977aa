//! Text tokenization helpers shared by the extractor and signal scoring.

/// Lowercased alphanumeric tokens of a text, in order.
///
/// Phrases are normalized through the same function, so matching is
/// insensitive to case and punctuation ("we'll see" matches "we ll see").
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Whitespace-separated raw words, preserving internal punctuation.
///
/// Used for structural tokens that the alphanumeric tokenizer would split,
/// such as `6/21` expiry dates.
pub fn raw_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Whether a phrase (as tokens) occurs anywhere in a token stream.
pub fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    count_phrase(tokens, phrase) > 0
}

/// Non-overlapping occurrences of a phrase in a token stream.
pub fn count_phrase(tokens: &[String], phrase: &[String]) -> u32 {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + phrase.len() <= tokens.len() {
        if tokens[i..i + phrase.len()] == *phrase {
            count += 1;
            i += phrase.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Whether a text reads as ALL-CAPS shouting.
///
/// Requires at least 6 alphabetic characters with 70% or more uppercase.
pub fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 6 {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper * 10 >= letters.len() * 7
}

/// Number of exclamation marks in a text.
pub fn exclamation_count(text: &str) -> u32 {
    text.chars().filter(|c| *c == '!').count() as u32
}
