//! Sentence segmentation and word tokenization.

/// Words that end in a period without ending the sentence.
/// Stored lowercase and without the trailing period.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "e.g", "i.e", "cf",
    "al", "inc", "ltd", "co", "corp", "dept", "est", "approx", "fig", "figs", "vol",
    "pp", "ed", "eds", "rev", "gen", "gov", "sen", "rep", "col", "capt", "lt", "sgt", "jan",
    "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "u.k",
    "u.n", "e.u", "a.m", "p.m", "ph.d",
];

/// Abbreviations that are also ordinary words ("no"); only taken as such before a number.
const NUMBER_ABBREVIATIONS: &[&str] = &["no", "nos"];

/// Capitalized words that usually open a sentence rather than continue a name.
/// After a single capital letter ("Plan B. It ...") they mark a sentence boundary.
const SENTENCE_OPENERS: &[&str] = &[
    "a", "an", "the", "it", "its", "i", "we", "he", "she", "they", "you", "this", "that",
    "these", "those", "there", "here", "but", "and", "or", "so", "then", "yet", "if", "when",
    "while", "after", "before", "however", "in", "on", "at", "for", "as", "my", "our", "his",
    "her", "their", "your", "what", "how", "why", "one", "also", "no",
];

/// Characters that may trail terminal punctuation and still belong to the sentence.
fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '}' | '”' | '’' | '»')
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// A sentence of a document, borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// 0-based position in the document
    pub index: usize,
    pub text: &'a str,
}

/// Split `text` into sentences.
///
/// A sentence ends at `.`, `!` or `?` (plus any closing quotes or brackets) when it is followed
/// by whitespace and then something other than a lowercase letter, or by the end of the text.
/// Known abbreviations and single-letter initials do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !is_terminal(c) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (is_terminal(chars[j].1) || is_closing(chars[j].1)) {
            j += 1;
        }
        let end = chars.get(j).map(|&(p, _)| p).unwrap_or(text.len());

        let mut k = j;
        while k < chars.len() && chars[k].1.is_whitespace() {
            k += 1;
        }

        let boundary = if j == chars.len() {
            true
        } else if k == j {
            // "3.14", "example.com", "Yahoo!Mail"
            false
        } else if k == chars.len() {
            true
        } else if chars[k].1.is_lowercase() {
            false
        } else {
            let after = &text[chars[k].0..];
            !(c == '.' && j == i + 1 && ends_with_abbreviation(&text[start..pos], after))
        };

        if boundary {
            push_sentence(&mut sentences, &text[start..end]);
            start = chars.get(k).map(|&(p, _)| p).unwrap_or(text.len());
        }
        i = j;
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }
    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<Sentence<'a>>, span: &'a str) {
    let span = span.trim();
    if !span.is_empty() {
        sentences.push(Sentence {
            index: sentences.len(),
            text: span,
        });
    }
}

/// True when the text right before a period is an abbreviation or an initial.
///
/// `after` is the text following the period and its whitespace.
fn ends_with_abbreviation(before: &str, after: &str) -> bool {
    let word_start = before
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_alphabetic() || c == '.'))
        .map(|(p, c)| p + c.len_utf8())
        .unwrap_or(0);
    let word = before[word_start..].trim_matches('.');
    if word.is_empty() {
        return false;
    }

    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        return first.is_uppercase() && !starts_with_opener(after);
    }

    let lower = word.to_lowercase();
    if NUMBER_ABBREVIATIONS.contains(&lower.as_str()) {
        return after.starts_with(|c: char| c.is_ascii_digit());
    }
    ABBREVIATIONS.contains(&lower.as_str())
}

fn starts_with_opener(text: &str) -> bool {
    let next = text
        .trim_start_matches(|c: char| is_closing(c) || c == '(' || c == '[')
        .split(|c: char| !c.is_alphabetic())
        .next()
        .unwrap_or("")
        .to_lowercase();
    SENTENCE_OPENERS.contains(&next.as_str())
}

/// Split `text` into lowercase, purely alphabetic tokens.
///
/// Words are separated at any character that is neither alphanumeric nor an apostrophe.
/// Contractions and possessives keep only their stem ("isn't" -> "is", "dog's" -> "dog").
/// Tokens containing digits are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || is_apostrophe(c)))
        .map(word_stem)
        .filter(|w| !w.is_empty() && w.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect()
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

fn word_stem(word: &str) -> &str {
    let word = word.trim_matches(is_apostrophe);
    let Some(pos) = word.find(is_apostrophe) else {
        return word;
    };
    let stem = &word[..pos];
    // "n't" belongs to the negation, not the stem
    let negation = word[pos..].chars().nth(1).map_or(false, |c| c.eq_ignore_ascii_case(&'t'));
    match stem.char_indices().last() {
        Some((last, c)) if negation && c.eq_ignore_ascii_case(&'n') => &stem[..last],
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(sentences: &[Sentence<'a>]) -> Vec<&'a str> {
        sentences.iter().map(|s| s.text).collect()
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("Cats are great. Dogs are great too! Birds can fly? Fish swim well.");
        assert_eq!(
            texts(&sentences),
            vec!["Cats are great.", "Dogs are great too!", "Birds can fly?", "Fish swim well."]
        );
        let indices: Vec<usize> = sentences.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn text_without_terminal_punctuation_is_one_sentence() {
        assert_eq!(texts(&split_sentences("  no punctuation here  ")), vec!["no punctuation here"]);
    }

    #[test]
    fn abbreviations_and_initials_do_not_split() {
        let sentences = split_sentences(
            "Dr. Smith met Mr. Jones in the U.S. Army base. J. R. Tolkien wrote books, e.g. The Hobbit. It sold well.",
        );
        assert_eq!(
            texts(&sentences),
            vec![
                "Dr. Smith met Mr. Jones in the U.S. Army base.",
                "J. R. Tolkien wrote books, e.g. The Hobbit.",
                "It sold well.",
            ]
        );
    }

    #[test]
    fn ordinary_words_ending_in_a_period_still_split() {
        let sentences = split_sentences("The answer was no. We moved on. Plan B. It worked.");
        assert_eq!(
            texts(&sentences),
            vec!["The answer was no.", "We moved on.", "Plan B.", "It worked."]
        );
    }

    #[test]
    fn number_abbreviation_before_digits_does_not_split() {
        let sentences = split_sentences("See No. 5 and nos. 7 to 9 in the list. Vitamin C. Then lunch.");
        assert_eq!(
            texts(&sentences),
            vec!["See No. 5 and nos. 7 to 9 in the list.", "Vitamin C.", "Then lunch."]
        );
    }

    #[test]
    fn initials_inside_names_do_not_split() {
        let sentences = split_sentences("A book by J. K. Rowling sold well. George W. Bush read it.");
        assert_eq!(
            texts(&sentences),
            vec!["A book by J. K. Rowling sold well.", "George W. Bush read it."]
        );
    }

    #[test]
    fn decimals_and_domains_do_not_split() {
        let sentences = split_sentences("Version 3.14 shipped on example.com today. Next one soon.");
        assert_eq!(
            texts(&sentences),
            vec!["Version 3.14 shipped on example.com today.", "Next one soon."]
        );
    }

    #[test]
    fn lowercase_continuation_does_not_split() {
        let sentences = split_sentences("It costs approx. ten dollars. Wow... that is cheap. Really.");
        assert_eq!(
            texts(&sentences),
            vec!["It costs approx. ten dollars.", "Wow... that is cheap.", "Really."]
        );
    }

    #[test]
    fn closing_quotes_stay_with_their_sentence() {
        let sentences = split_sentences("He said \"Stop.\" Then he left. (It was late.) Done");
        assert_eq!(
            texts(&sentences),
            vec!["He said \"Stop.\"", "Then he left.", "(It was late.)", "Done"]
        );
    }

    #[test]
    fn tokens_are_lowercase_and_alphabetic() {
        assert_eq!(
            tokenize("The Quick brown-fox, jumped over 2 dogs in 2024! COVID19 isn't"),
            vec!["the", "quick", "brown", "fox", "jumped", "over", "dogs", "in", "is"]
        );
    }

    #[test]
    fn contractions_keep_their_stem() {
        assert_eq!(
            tokenize("The dog's bowl. They don't know 'quoted' words we\u{2019}ll keep"),
            vec!["the", "dog", "bowl", "they", "do", "know", "quoted", "words", "we", "keep"]
        );
    }

    #[test]
    fn tokens_keep_non_ascii_letters() {
        assert_eq!(tokenize("Café naïve Über"), vec!["café", "naïve", "über"]);
    }
}
