//! Sentence splitting
//!
//! Splits feedback documents into sentences at whitespace runs that
//! follow a terminator (`.`, `!`, `?`) and precede an uppercase letter,
//! quote, or opening parenthesis. Fragments of 15 characters or fewer
//! are discarded. Document order is preserved; multiple documents are
//! concatenated with blank lines before splitting.

const MIN_SENTENCE_CHARS: usize = 15;

/// Split one text blob into sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() && ends_with_terminator(&current) {
            // Look past the whitespace run for a sentence opener.
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && is_sentence_opener(chars[j]) {
                push_sentence(&mut sentences, &current);
                current.clear();
                i = j;
                continue;
            }
        }
        current.push(c);
        i += 1;
    }
    push_sentence(&mut sentences, &current);
    sentences
}

/// Join documents with blank lines and split the combined text.
pub fn split_documents(documents: &[String]) -> Vec<String> {
    split_sentences(&documents.join("\n\n"))
}

fn ends_with_terminator(s: &str) -> bool {
    matches!(s.chars().last(), Some('.') | Some('!') | Some('?'))
}

fn is_sentence_opener(c: char) -> bool {
    c.is_ascii_uppercase() || c == '"' || c == '\'' || c == '('
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let s = raw.trim();
    if s.chars().count() > MIN_SENTENCE_CHARS {
        sentences.push(s.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_split() {
        let text = "The dashboard loads slowly on mobile. Search results are often empty! Why does the export button hide?";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "The dashboard loads slowly on mobile.");
    }

    #[test]
    fn test_no_split_before_lowercase() {
        // "e.g. the" must not split: the follower is lowercase
        let text = "Exports are broken in some formats, e.g. the quarterly spreadsheet download.";
        assert_eq!(split_sentences(text).len(), 1);
    }

    #[test]
    fn test_short_fragments_dropped() {
        let text = "Bad. This sentence is long enough to keep around. Ok.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 1);
        assert!(sentences[0].starts_with("This sentence"));
    }

    #[test]
    fn test_quote_and_paren_openers() {
        let text = "Users said the new layout confused them badly. \"Where did my reports go?\" was a common question. (Several tickets mention the sidebar.)";
        assert_eq!(split_sentences(text).len(), 3);
    }

    #[test]
    fn test_documents_concatenate_in_order() {
        let docs = vec![
            "First document says the app is wonderful overall.".to_string(),
            "Second document complains about loading times often.".to_string(),
        ];
        let sentences = split_documents(&docs);
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("First"));
        assert!(sentences[1].starts_with("Second"));
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n  ").is_empty());
    }
}
