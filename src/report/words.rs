//! Page text extraction and tokenization

use crate::crawler::FetchResult;
use scraper::Html;

/// Elements whose text is never page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// English stopwords excluded from the common-word ranking
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's", "me",
    "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on", "once",
    "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
    "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then", "there",
    "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd",
    "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
    "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with", "won't",
    "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

/// Returns true if the word is excluded from the common-word ranking
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Extracts the lowercase words of a delivered HTML page
///
/// Failed or body-less responses, non-HTML content and
/// `Content-Disposition: attachment` responses yield no words. Malformed
/// markup degrades to whatever text the parser recovered.
pub fn extract_words(result: &FetchResult) -> Vec<String> {
    if !result.is_delivery() || !result.is_html() || result.is_attachment() {
        return Vec::new();
    }

    let Some(body) = result.body.as_deref() else {
        return Vec::new();
    };

    let document = Html::parse_document(&String::from_utf8_lossy(body));
    tokenize(&visible_text(&document))
}

/// Collects the text nodes outside of script-like elements
fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()));

        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }

    text
}

/// Splits text into lowercase words
///
/// A word is a run of ASCII letters, digits and inner apostrophes of at least
/// two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\''))
        .filter(|token| token.len() >= 2)
        .map(str::to_ascii_lowercase)
        .collect()
}
