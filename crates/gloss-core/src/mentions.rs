//! `@mention` scanning for entry descriptions.
//!
//! Descriptions written outside the mention-aware editor (bulk import, API
//! writers) carry references as plain `@Name` text. The tokenizer here turns
//! such text into a deduplicated list of candidate names. Matching those names
//! against stored entries happens in `gloss-db`; nothing here touches I/O.
//!
//! A mention starts at an `@` whose next character is alphanumeric and that
//! is not glued to a preceding word character (so `coach@gym.com` is not a
//! mention). An `@` that ends one name starts the next, so `@Plank@Squat`
//! yields both. The name then runs until one of:
//!
//! - end of input, a line break, or another `@`
//! - sentence punctuation or a bracket/quote (`. , ! ? ; : ( ) [ ] { } "`)
//! - whitespace immediately followed by a lowercase letter
//!
//! so `"Hello @Burpees and @Jumping Jacks."` yields `Burpees` and
//! `Jumping Jacks`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A mention that resolved to a stored entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ResolvedMention {
    /// Title of the target entry as stored.
    pub name: String,
    pub target_id: String,
}

/// Case-folded form of a title or token used for mention matching.
#[must_use]
pub fn title_key(name: &str) -> String {
    name.to_lowercase()
}

const fn is_terminator(c: char) -> bool {
    matches!(
        c,
        '@' | '\n' | '\r' | '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '"'
    )
}

fn is_blank(c: char) -> bool {
    c.is_whitespace() && !matches!(c, '\n' | '\r')
}

/// Scan `text` for `@Name` tokens.
///
/// Returns unique names in first-seen order. Duplicates are exact-match only;
/// case-folding is left to the resolver, which matches titles
/// case-insensitively.
#[must_use]
pub fn scan_mentions(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut prev_end = None;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '@' {
            i += 1;
            continue;
        }

        // An `@` that closed the previous name opens the next one.
        let glued = i > 0
            && prev_end != Some(i)
            && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_');
        let start = i + 1;
        if glued || start >= chars.len() || !chars[start].is_alphanumeric() {
            i = start;
            continue;
        }

        let mut end = start;
        while end < chars.len() {
            let c = chars[end];
            if is_terminator(c) {
                break;
            }
            if is_blank(c) {
                let run_end = chars[end..]
                    .iter()
                    .position(|&c| !is_blank(c))
                    .map_or(chars.len(), |offset| end + offset);
                match chars.get(run_end) {
                    Some(&next) if !next.is_lowercase() => {
                        end = run_end;
                        continue;
                    }
                    _ => break,
                }
            }
            end += 1;
        }

        let token: String = chars[start..end].iter().collect();
        let token = token.trim_end().to_string();
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
        prev_end = Some(end);
        i = end;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Hello @Burpees and @Unknown", &["Burpees", "Unknown"])]
    #[case("Try @Jumping Jacks before running", &["Jumping Jacks"])]
    #[case("Finish with @Plank.", &["Plank"])]
    #[case("@Squat, @Lunge; @Deadlift!", &["Squat", "Lunge", "Deadlift"])]
    #[case("see (@Push Up) first", &["Push Up"])]
    #[case("@RPE 10 is maximal", &["RPE 10"])]
    #[case("@Squat and @Squat again", &["Squat"])]
    #[case("@squat then @Squat", &["squat", "Squat"])]
    #[case("@Burpees\n@Plank", &["Burpees", "Plank"])]
    #[case("trailing @Plank   ", &["Plank"])]
    #[case("@Plank@Squat", &["Plank", "Squat"])]
    #[case("@Plank@Squat@Lunge", &["Plank", "Squat", "Lunge"])]
    #[case("@Jumping   Jacks", &["Jumping   Jacks"])]
    #[case("@Plank   then rest", &["Plank"])]
    fn scans_mentions(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(scan_mentions(text), expected);
    }

    #[rstest]
    #[case("")]
    #[case("no mentions here")]
    #[case("mail coach@gym.com today")]
    #[case("a lone @ sign")]
    #[case("@ Burpees with a gap")]
    #[case("@@")]
    #[case("@-dash")]
    #[case("reach coach@gym.com or team@Gym")]
    fn ignores_non_mentions(#[case] text: &str) {
        assert!(scan_mentions(text).is_empty(), "unexpected tokens in {text:?}");
    }

    #[test]
    fn multibyte_names_survive() {
        assert_eq!(scan_mentions("Do @Ünterschwung now"), vec!["Ünterschwung"]);
    }

    #[rstest]
    #[case("Burpees", "BURPEES")]
    #[case("Élan", "élan")]
    #[case("ÉLAN", "élan")]
    #[case("Ünterschwung", "üNTERSCHWUNG")]
    fn title_keys_fold_unicode_case(#[case] title: &str, #[case] token: &str) {
        assert_eq!(title_key(title), title_key(token));
    }

    #[test]
    fn long_blank_runs_scan_in_one_pass() {
        let text = format!("@Plank{}done", " ".repeat(200_000));
        assert_eq!(scan_mentions(&text), vec!["Plank"]);
        let text = format!("@Plank{}", "\t".repeat(200_000));
        assert_eq!(scan_mentions(&text), vec!["Plank"]);
    }
}
