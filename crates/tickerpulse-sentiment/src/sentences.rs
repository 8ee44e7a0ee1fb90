//! Rule-based sentence boundary detection for English news prose.

/// Lowercased abbreviations (without the trailing period) that never end a
/// sentence on their own.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "vs", "no", "nos", "inc",
    "corp", "co", "ltd", "llc", "plc", "bros", "dept", "est", "approx", "gov", "sen", "rep",
    "gen", "lt", "col", "fig", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept",
    "oct", "nov", "dec", "e.g", "i.e", "u.s", "u.k", "u.n", "e.u", "a.m", "p.m",
];

/// Characters that may trail a terminator and still close the sentence.
const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '\u{201d}', '\u{2019}'];

/// Split `text` into sentences.
///
/// Whitespace inside each sentence is collapsed to single spaces. Blank lines
/// always end the current sentence. Empty or whitespace-only input yields no
/// sentences.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for paragraph in paragraphs(text) {
        let tokens: Vec<&str> = paragraph.split_whitespace().collect();
        let mut current: Vec<&str> = Vec::new();
        for (i, &token) in tokens.iter().enumerate() {
            current.push(token);
            let next = tokens.get(i + 1).copied();
            if ends_sentence(token, next) {
                sentences.push(current.join(" "));
                current.clear();
            }
        }
        if !current.is_empty() {
            sentences.push(current.join(" "));
        }
    }
    sentences
}

/// Number of whitespace-separated words in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                out.push(std::mem::take(&mut current));
            }
            current.clear();
        } else {
            current.push_str(line);
            current.push(' ');
        }
    }
    if !current.trim().is_empty() {
        out.push(current);
    }
    out
}

fn ends_sentence(token: &str, next: Option<&str>) -> bool {
    let core = token.trim_end_matches(CLOSERS);
    let Some(last) = core.chars().last() else {
        return false;
    };
    if !matches!(last, '.' | '!' | '?') {
        return false;
    }
    let Some(next) = next else {
        return true;
    };
    if !starts_new_sentence(next) {
        return false;
    }
    if last != '.' || core.ends_with("..") {
        return true;
    }
    !is_abbreviation(core)
}

fn starts_new_sentence(next: &str) -> bool {
    next.chars()
        .find(|c| !matches!(c, '"' | '\'' | '(' | '[' | '\u{201c}' | '\u{2018}'))
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || c == '$')
}

fn is_abbreviation(core: &str) -> bool {
    let word = core
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches('.');
    if word.is_empty() {
        return false;
    }
    let lower = word.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // Single initials ("J.") and dotted acronyms ("N.Y.").
    word.split('.')
        .all(|part| part.chars().count() == 1 && part.chars().all(char::is_alphabetic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("Shares rose 4%. Analysts cheered! Will it last? Nobody knows.");
        assert_eq!(
            sentences,
            vec![
                "Shares rose 4%.",
                "Analysts cheered!",
                "Will it last?",
                "Nobody knows."
            ]
        );
    }

    #[test]
    fn keeps_abbreviations_and_decimals_inside_sentence() {
        let text = "Mr. Huang said revenue hit $30.5 billion in the U.S. market. Dr. Su disagreed.";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "Mr. Huang said revenue hit $30.5 billion in the U.S. market.",
                "Dr. Su disagreed."
            ]
        );
    }

    #[test]
    fn keeps_initials_inside_sentence() {
        let sentences = split_sentences("J. P. Morgan raised its target. The stock jumped.");
        assert_eq!(
            sentences,
            vec!["J. P. Morgan raised its target.", "The stock jumped."]
        );
    }

    #[test]
    fn lowercase_continuation_is_not_a_boundary() {
        let sentences = split_sentences("The fund holds approx. nine percent of shares.");
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn closing_quote_stays_with_sentence() {
        let sentences = split_sentences("He said \"demand is insane.\" Shares rose.");
        assert_eq!(
            sentences,
            vec!["He said \"demand is insane.\"", "Shares rose."]
        );
    }

    #[test]
    fn blank_line_ends_sentence_and_whitespace_is_normalized() {
        let sentences = split_sentences("Headline without period\n\n  Body   text\nwraps here.  ");
        assert_eq!(
            sentences,
            vec!["Headline without period", "Body text wraps here."]
        );
    }

    #[test]
    fn empty_input_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(" \n\t ").is_empty());
    }

    #[test]
    fn word_count_counts_whitespace_tokens() {
        assert_eq!(word_count("one  two\nthree"), 3);
        assert_eq!(word_count(""), 0);
    }
}
