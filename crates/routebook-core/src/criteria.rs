//! Free-text eligibility criteria parser.
//!
//! Grammar:
//!
//! ```text
//! criteria := clause (SEP clause)*
//! SEP      := ',' | ';' | '.' | ':' | '!' | '?' | newline | "and" | "but"
//! clause   := phrase*
//! phrase   := attribute-name | value | negation | other-word
//! negation := "not" | "except" | "excluding" | "without" | "no"
//! ```
//!
//! Phrases match whole words, case-insensitively, longest first. A value is
//! credited to the nearest attribute named in its clause that knows it, or
//! else to the first attribute (in [`AttributeKey::ALL`] order) that does.
//! A negation flips every later value in the same clause to an exclusion.
//! Hyphens and apostrophes split words, so "Spanish-speaking" names Spanish.
//!
//! A clause opened by "and" that names no attribute continues the previous
//! one: its values go to the attribute the previous clause ended on, negated
//! when that last value was. "Intent Returns and Sales" is one intent list.
//!
//! Values of one attribute are OR'd, attributes are AND'd, exclusions are
//! AND-NOT. Nothing here errors: unknown words are skipped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::vocabulary::AttributeKey;
use crate::UserRecord;

const NEGATIONS: &[&str] = &["not", "except", "excluding", "without", "no"];

/// The constraint one attribute places on a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedClause {
    pub attribute: AttributeKey,
    /// Accepted values; a user needs at least one (when non-empty).
    pub values: Vec<String>,
    /// Values a user must not hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
}

impl ParsedClause {
    pub fn admits(&self, held: &[&str]) -> bool {
        let has = |v: &String| held.iter().any(|h| h.eq_ignore_ascii_case(v));
        let accepted = self.values.is_empty() || self.values.iter().any(has);
        accepted && !self.excluded.iter().any(has)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ParsedCriteria {
    /// At most one clause per attribute, in [`AttributeKey::ALL`] order.
    pub clauses: Vec<ParsedClause>,
}

impl ParsedCriteria {
    /// True when the text named no recognized value, i.e. no filter applies.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clause(&self, key: AttributeKey) -> Option<&ParsedClause> {
        self.clauses.iter().find(|c| c.attribute == key)
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        self.clauses
            .iter()
            .all(|c| c.admits(&user.values_for(c.attribute)))
    }
}

enum PhraseKind {
    Attribute(AttributeKey),
    /// Every attribute that knows this value, with its canonical spelling.
    Value(Vec<(AttributeKey, &'static str)>),
    Negation,
}

struct Phrase {
    words: Vec<String>,
    kind: PhraseKind,
}

enum Hit<'p> {
    Mention(AttributeKey),
    Value {
        owners: &'p [(AttributeKey, &'static str)],
        negated: bool,
    },
}

fn words_of(s: &str) -> Vec<String> {
    s.split_whitespace().map(|w| w.to_lowercase()).collect()
}

fn phrase_table() -> Vec<Phrase> {
    let mut phrases = Vec::new();
    for key in AttributeKey::ALL {
        for name in key.names() {
            phrases.push(Phrase {
                words: words_of(name),
                kind: PhraseKind::Attribute(key),
            });
        }
    }
    for key in AttributeKey::ALL {
        for value in key.values() {
            let words = words_of(value);
            let existing = phrases
                .iter_mut()
                .find(|p| p.words == words && matches!(p.kind, PhraseKind::Value(_)));
            match existing {
                Some(Phrase {
                    kind: PhraseKind::Value(owners),
                    ..
                }) => owners.push((key, *value)),
                _ => phrases.push(Phrase {
                    words,
                    kind: PhraseKind::Value(vec![(key, *value)]),
                }),
            }
        }
    }
    for neg in NEGATIONS {
        phrases.push(Phrase {
            words: words_of(neg),
            kind: PhraseKind::Negation,
        });
    }
    phrases
}

#[derive(Debug, Default, PartialEq)]
struct Clause {
    words: Vec<String>,
    /// Opened by "and" directly after another clause.
    continues: bool,
}

#[derive(Default)]
struct Splitter {
    clauses: Vec<Clause>,
    current: Clause,
    word: String,
}

impl Splitter {
    fn close(&mut self, continues: bool) {
        if self.current.words.is_empty() {
            self.current.continues &= continues;
            return;
        }
        self.clauses.push(std::mem::take(&mut self.current));
        self.current.continues = continues;
    }

    fn end_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        match word.as_str() {
            "and" => self.close(true),
            "but" => self.close(false),
            _ => self.current.words.push(word),
        }
    }
}

/// Lowercased words grouped by clause. Empty clauses are dropped.
fn split_clauses(text: &str) -> Vec<Clause> {
    let mut splitter = Splitter::default();
    for ch in text.chars() {
        if ch.is_alphanumeric() || matches!(ch, '%' | '+') {
            splitter.word.extend(ch.to_lowercase());
            continue;
        }
        splitter.end_word();
        if matches!(ch, ',' | ';' | '.' | ':' | '!' | '?' | '\n') {
            splitter.close(false);
        }
    }
    splitter.end_word();
    splitter.close(false);
    splitter.clauses
}

fn scan<'p>(words: &[String], phrases: &'p [Phrase]) -> Vec<(usize, Hit<'p>)> {
    let mut hits = Vec::new();
    let mut negated = false;
    let mut i = 0;
    while i < words.len() {
        let best = phrases
            .iter()
            .filter(|p| words[i..].starts_with(&p.words))
            .max_by_key(|p| p.words.len());
        let Some(phrase) = best else {
            i += 1;
            continue;
        };
        match &phrase.kind {
            PhraseKind::Attribute(key) => hits.push((i, Hit::Mention(*key))),
            PhraseKind::Value(owners) => hits.push((i, Hit::Value { owners, negated })),
            PhraseKind::Negation => negated = true,
        }
        i += phrase.words.len();
    }
    hits
}

fn resolve(
    pos: usize,
    owners: &[(AttributeKey, &'static str)],
    mentions: &[(usize, AttributeKey)],
) -> (AttributeKey, &'static str) {
    mentions
        .iter()
        .filter_map(|(at, key)| {
            owners
                .iter()
                .find(|(k, _)| k == key)
                .map(|owner| (at.abs_diff(pos), *owner))
        })
        .min_by_key(|(dist, _)| *dist)
        .map(|(_, owner)| owner)
        .unwrap_or(owners[0])
}

/// Where the previous clause's value list ended.
#[derive(Clone, Copy)]
struct Carry {
    attribute: AttributeKey,
    negated: bool,
}

/// Parse criteria text into per-attribute clauses.
pub fn parse_criteria(text: &str) -> ParsedCriteria {
    let phrases = phrase_table();
    let mut accepted: HashMap<AttributeKey, Vec<String>> = HashMap::new();
    let mut excluded: HashMap<AttributeKey, Vec<String>> = HashMap::new();
    let mut carry: Option<Carry> = None;

    for clause in split_clauses(text) {
        let hits = scan(&clause.words, &phrases);
        let mentions: Vec<(usize, AttributeKey)> = hits
            .iter()
            .filter_map(|(pos, hit)| match hit {
                Hit::Mention(key) => Some((*pos, *key)),
                Hit::Value { .. } => None,
            })
            .collect();
        let inherited = carry.filter(|_| clause.continues && mentions.is_empty());
        carry = None;

        for (pos, hit) in &hits {
            let Hit::Value { owners, negated } = hit else {
                continue;
            };
            let continued = inherited.and_then(|c| {
                owners
                    .iter()
                    .find(|(k, _)| *k == c.attribute)
                    .map(|owner| (*owner, *negated || c.negated))
            });
            let ((key, value), negated) =
                continued.unwrap_or_else(|| (resolve(*pos, owners, &mentions), *negated));
            carry = Some(Carry {
                attribute: key,
                negated,
            });
            let bucket = if negated { &mut excluded } else { &mut accepted };
            let list = bucket.entry(key).or_default();
            if !list.iter().any(|v| v == value) {
                list.push(value.to_string());
            }
        }
    }

    let clauses = AttributeKey::ALL
        .into_iter()
        .filter_map(|key| {
            let values = accepted.remove(&key).unwrap_or_default();
            let excluded = excluded.remove(&key).unwrap_or_default();
            (!values.is_empty() || !excluded.is_empty()).then(|| ParsedClause {
                attribute: key,
                values,
                excluded,
            })
        })
        .collect();

    ParsedCriteria { clauses }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(parsed: &ParsedCriteria, key: AttributeKey) -> Vec<&str> {
        parsed
            .clause(key)
            .map(|c| c.values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn clause(words: &[&str], continues: bool) -> Clause {
        Clause {
            words: words.iter().map(|w| w.to_string()).collect(),
            continues,
        }
    }

    #[test]
    fn test_split_clauses() {
        let clauses = split_clauses("Spanish or English language, Skills Gold tier\nand Europe");
        assert_eq!(
            clauses,
            vec![
                clause(&["spanish", "or", "english", "language"], false),
                clause(&["skills", "gold", "tier"], false),
                clause(&["europe"], false),
            ]
        );

        let clauses = split_clauses("Billing and Sales but Europe's");
        assert_eq!(
            clauses,
            vec![
                clause(&["billing"], false),
                clause(&["sales"], true),
                clause(&["europe", "s"], false),
            ]
        );
    }

    #[test]
    fn test_hyphen_and_apostrophe_split_words() {
        let parsed = parse_criteria("Spanish-speaking agents");
        assert_eq!(values(&parsed, AttributeKey::Language), vec!["Spanish"]);

        let parsed = parse_criteria("Gold-tier reps in Europe's offices");
        assert_eq!(values(&parsed, AttributeKey::Skills), vec!["Gold tier"]);
        assert_eq!(values(&parsed, AttributeKey::Region), vec!["Europe"]);
    }

    #[test]
    fn test_and_continues_attribute_scope() {
        let parsed = parse_criteria("Intent Returns and Sales");
        assert_eq!(values(&parsed, AttributeKey::Intent), vec!["Returns", "Sales"]);
        assert!(parsed.clause(AttributeKey::Skills).is_none());
    }

    #[test]
    fn test_and_continues_negation() {
        let parsed = parse_criteria("Language not Spanish and French");
        let language = parsed.clause(AttributeKey::Language).unwrap();
        assert!(language.values.is_empty());
        assert_eq!(language.excluded, vec!["Spanish", "French"]);
    }

    #[test]
    fn test_and_with_new_attribute_starts_fresh() {
        let parsed = parse_criteria("Language not Spanish and Region Europe");
        assert_eq!(parsed.clause(AttributeKey::Language).unwrap().excluded, vec!["Spanish"]);
        assert_eq!(values(&parsed, AttributeKey::Region), vec!["Europe"]);

        // Europe isn't a language, so it resolves on its own and stays accepted.
        let parsed = parse_criteria("not Spanish and Europe");
        assert_eq!(values(&parsed, AttributeKey::Region), vec!["Europe"]);

        // Punctuation ends the list.
        let parsed = parse_criteria("Language not Spanish, French");
        assert_eq!(values(&parsed, AttributeKey::Language), vec!["French"]);
    }

    #[test]
    fn test_example_sentence() {
        let parsed = parse_criteria(
            "Users with Spanish or English language, Skills Gold tier or Platinum tier",
        );
        assert_eq!(values(&parsed, AttributeKey::Language), vec!["Spanish", "English"]);
        assert_eq!(values(&parsed, AttributeKey::Skills), vec!["Gold tier", "Platinum tier"]);
        assert_eq!(parsed.clauses.len(), 2);
    }

    #[test]
    fn test_longest_phrase_wins() {
        let parsed = parse_criteria("intent Billing Inquiry");
        assert_eq!(values(&parsed, AttributeKey::Intent), vec!["Billing Inquiry"]);
        assert!(parsed.clause(AttributeKey::Skills).is_none());
    }

    #[test]
    fn test_whole_words_only() {
        let parsed = parse_criteria("Englishman from Europeans");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_named_attribute_scopes_shared_value() {
        let parsed = parse_criteria("Intent Technical Support");
        assert_eq!(values(&parsed, AttributeKey::Intent), vec!["Technical Support"]);
        assert!(parsed.clause(AttributeKey::Skills).is_none());

        let parsed = parse_criteria("Technical Support");
        assert_eq!(values(&parsed, AttributeKey::Skills), vec!["Technical Support"]);
    }

    #[test]
    fn test_nearest_mention_in_clause() {
        let parsed = parse_criteria("skills Sales or intent Returns");
        assert_eq!(values(&parsed, AttributeKey::Skills), vec!["Sales"]);
        assert_eq!(values(&parsed, AttributeKey::Intent), vec!["Returns"]);
    }

    #[test]
    fn test_negation_is_clause_scoped() {
        let parsed = parse_criteria("English language, not in Europe or Africa; region North America");
        let region = parsed.clause(AttributeKey::Region).unwrap();
        assert_eq!(region.values, vec!["North America"]);
        assert_eq!(region.excluded, vec!["Europe", "Africa"]);
        assert_eq!(values(&parsed, AttributeKey::Language), vec!["English"]);
    }

    #[test]
    fn test_values_merge_across_clauses() {
        let parsed = parse_criteria("Spanish. French, spanish");
        assert_eq!(values(&parsed, AttributeKey::Language), vec!["Spanish", "French"]);
    }

    #[test]
    fn test_unknown_text_yields_no_clauses() {
        assert!(parse_criteria("").is_empty());
        assert!(parse_criteria("people who like tea").is_empty());
    }

    #[test]
    fn test_admits() {
        let clause = ParsedClause {
            attribute: AttributeKey::Language,
            values: vec!["Spanish".into()],
            excluded: vec!["French".into()],
        };
        assert!(clause.admits(&["spanish", "English"]));
        assert!(!clause.admits(&["Spanish", "French"]));
        assert!(!clause.admits(&[]));
    }
}
