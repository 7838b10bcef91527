//! Team identity resolution.
//!
//! Canonicalizes team-name strings so the same program matches across
//! ratings, odds and score feeds. The lookup table is built once and is
//! immutable afterwards; share it behind an `Arc` across threads.
//!
//! Resolution order:
//! 1. normalized alias lookup (case fold, punctuation strip, whitespace collapse)
//! 2. abbreviation expansion ("St." → "Saint" when leading, "State" otherwise)
//! 3. mascot suffix stripping
//! 4. fuzzy match against known names: whole-word containment, then
//!    character-position similarity above a floor. Both sides must carry
//!    the same school qualifiers ("State", "Tech", "A&M", ...), so a state
//!    school never folds into the flagship of the same name.
//! 5. otherwise the cleaned input, title-cased
//!
//! Resolution never fails; unresolved names degrade to a best-effort string.

mod aliases;

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use aliases::{ALIASES, MASCOTS};

/// Default minimum similarity for a fuzzy match.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.6;

/// Shortest normalized name eligible for containment matching.
const MIN_CONTAINMENT_LEN: usize = 4;

/// Tokens that name a different program when added to a school name.
const QUALIFIERS: &[&str] = &["state", "tech", "a", "m", "poly", "polytechnic", "international"];

/// Immutable team-name lookup structure.
#[derive(Debug, Clone)]
pub struct TeamResolver {
    /// Normalized spelling → canonical name.
    lookup: HashMap<String, String>,
    /// Normalized canonical name → canonical name, for fuzzy matching.
    known: Vec<(String, String)>,
    min_similarity: f64,
}

impl Default for TeamResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamResolver {
    /// Resolver over the built-in alias table.
    pub fn new() -> Self {
        Self::with_teams(std::iter::empty::<&str>())
    }

    /// Resolver over the built-in aliases plus the given canonical names
    /// (typically the keys of the current rating set).
    pub fn with_teams<I, S>(teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lookup = HashMap::new();
        let mut canonical: BTreeSet<String> = BTreeSet::new();

        for (alias, target) in ALIASES {
            lookup.insert(normalize(alias), (*target).to_string());
            canonical.insert((*target).to_string());
        }
        for team in teams {
            let team = team.as_ref().trim();
            if !team.is_empty() {
                canonical.insert(team.to_string());
            }
        }
        for name in &canonical {
            lookup.entry(normalize(name)).or_insert_with(|| name.clone());
        }

        let known = canonical
            .into_iter()
            .map(|name| (normalize(&name), name))
            .collect();

        Self {
            lookup,
            known,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    /// Override the fuzzy-match similarity floor.
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Number of canonical names known to the resolver.
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// Resolve a raw team name to its canonical form.
    pub fn resolve(&self, raw: &str) -> String {
        let cleaned = normalize(raw);
        if cleaned.is_empty() {
            return raw.trim().to_string();
        }
        if let Some(hit) = self.lookup.get(&cleaned) {
            return hit.clone();
        }

        let expanded = expand_abbreviations(&cleaned);
        if let Some(hit) = self.lookup.get(&expanded) {
            return hit.clone();
        }

        let stripped = strip_mascot(&expanded);
        if let Some(hit) = self.lookup.get(&stripped) {
            return hit.clone();
        }

        if let Some(hit) = self.fuzzy(&stripped) {
            debug!(raw, resolved = %hit, "Fuzzy team match");
            return hit;
        }

        debug!(raw, "Team name unresolved, using cleaned form");
        title_case(&expanded)
    }

    /// Whether two raw names resolve to the same team.
    pub fn same_team(&self, a: &str, b: &str) -> bool {
        self.resolve(a) == self.resolve(b)
    }

    fn fuzzy(&self, name: &str) -> Option<String> {
        // Substring containment first, scored by length coverage.
        if name.len() >= MIN_CONTAINMENT_LEN {
            let best = self
                .known
                .iter()
                .filter(|(key, _)| key.len() >= MIN_CONTAINMENT_LEN)
                .filter(|(key, _)| same_qualifiers(name, key))
                .filter(|(key, _)| contains_words(key, name) || contains_words(name, key))
                .map(|(key, display)| {
                    let (short, long) = if key.len() < name.len() {
                        (key.len(), name.len())
                    } else {
                        (name.len(), key.len())
                    };
                    (short as f64 / long as f64, display)
                })
                .filter(|(coverage, _)| *coverage >= self.min_similarity)
                .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((_, display)) = best {
                return Some(display.clone());
            }
        }

        self.known
            .iter()
            .filter(|(key, _)| same_qualifiers(name, key))
            .map(|(key, display)| (positional_similarity(name, key), display))
            .filter(|(score, _)| *score >= self.min_similarity)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, display)| display.clone())
    }
}

/// Case fold, turn `&` into "and", drop other punctuation, collapse whitespace.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '&' {
            out.push_str(" and ");
        } else if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '/' {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand "st" to "saint" when it leads the name and "state" elsewhere.
fn expand_abbreviations(normalized: &str) -> String {
    normalized
        .split(' ')
        .enumerate()
        .map(|(i, token)| match (i, token) {
            (0, "st") => "saint",
            (_, "st") => "state",
            (_, "univ") => "university",
            (_, other) => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_mascot(name: &str) -> String {
    for mascot in MASCOTS {
        if let Some(prefix) = name.strip_suffix(mascot) {
            // Whole words only, and never strip the entire name.
            if prefix.ends_with(' ') && !prefix.trim_end().is_empty() {
                return prefix.trim_end().to_string();
            }
        }
    }
    name.to_string()
}

/// Whether `inner`'s words appear as a contiguous run of `outer`'s words.
fn contains_words(outer: &str, inner: &str) -> bool {
    let outer: Vec<&str> = outer.split(' ').collect();
    let inner: Vec<&str> = inner.split(' ').collect();
    inner.len() <= outer.len() && outer.windows(inner.len()).any(|w| w == inner.as_slice())
}

fn same_qualifiers(a: &str, b: &str) -> bool {
    let qualifiers = |s: &str| -> BTreeSet<String> {
        s.split(' ')
            .filter(|t| QUALIFIERS.contains(t))
            .map(str::to_string)
            .collect()
    };
    qualifiers(a) == qualifiers(b)
}

/// Fraction of positions holding the same character, over the longer length.
fn positional_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let same = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    same as f64 / longest as f64
}

fn title_case(normalized: &str) -> String {
    normalized
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_abbreviation() {
        let r = TeamResolver::new();
        assert_eq!(r.resolve("Ball St."), r.resolve("Ball State"));
        assert_eq!(r.resolve("Ball St."), "Ball State");
    }

    #[test]
    fn test_saint_abbreviation() {
        let r = TeamResolver::new();
        assert_eq!(r.resolve("St. Francis"), r.resolve("Saint Francis"));
        assert_eq!(r.resolve("St. Mary's"), "Saint Marys");
        assert_eq!(r.resolve("saint marys"), "Saint Marys");
    }

    #[test]
    fn test_unlisted_state_school_still_matches() {
        let r = TeamResolver::with_teams(["Wichita State"]);
        assert_eq!(r.resolve("Wichita St."), "Wichita State");
        assert_eq!(r.resolve("WICHITA  state"), "Wichita State");
    }

    #[test]
    fn test_abbreviations_and_punctuation() {
        let r = TeamResolver::new();
        assert_eq!(r.resolve("UConn"), "Connecticut");
        assert_eq!(r.resolve("Texas A & M"), "Texas A&M");
        assert_eq!(r.resolve("texas a and m"), "Texas A&M");
        assert_eq!(r.resolve("Miami (OH)"), "Miami Ohio");
    }

    #[test]
    fn test_mascot_stripping() {
        let r = TeamResolver::with_teams(["Duke", "Gonzaga"]);
        assert_eq!(r.resolve("Duke Blue Devils"), "Duke");
        assert_eq!(r.resolve("Gonzaga Bulldogs"), "Gonzaga");
        assert_eq!(r.resolve("Ole Miss Rebels"), "Mississippi");
    }

    #[test]
    fn test_fuzzy_positional_match() {
        let r = TeamResolver::with_teams(["Creighton"]);
        assert_eq!(r.resolve("Creightan"), "Creighton");
    }

    #[test]
    fn test_fuzzy_containment() {
        let r = TeamResolver::with_teams(["Saint Bonaventure"]);
        assert_eq!(r.resolve("Bonaventure"), "Saint Bonaventure");
    }

    #[test]
    fn test_state_school_not_merged_with_flagship() {
        let r = TeamResolver::new();
        assert_eq!(r.resolve("North Carolina State"), "North Carolina State");
        assert_eq!(r.resolve("NC State"), "North Carolina State");
        assert_eq!(r.resolve("UNC"), "North Carolina");

        let r = TeamResolver::with_teams(["Kansas State", "Texas Tech"]);
        assert_eq!(r.resolve("Kansas"), "Kansas");
        assert_eq!(r.resolve("Texas"), "Texas");
    }

    #[test]
    fn test_containment_needs_whole_words() {
        let r = TeamResolver::with_teams(["Arkansas"]);
        assert_eq!(r.resolve("Kansas"), "Kansas");
        assert!(contains_words("saint bonaventure", "bonaventure"));
        assert!(!contains_words("arkansas", "kansas"));
    }

    #[test]
    fn test_unresolved_degrades_to_cleaned_name() {
        let r = TeamResolver::new();
        assert_eq!(r.resolve("  nowhere   tech!! "), "Nowhere Tech");
        assert_eq!(r.resolve(""), "");
    }

    #[test]
    fn test_similarity_floor_rejects_distant_names() {
        let r = TeamResolver::with_teams(["Kentucky"]);
        assert_eq!(r.resolve("Xyzzy"), "Xyzzy");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  St. John's "), "st johns");
        assert_eq!(normalize("Texas A&M"), "texas a and m");
        assert_eq!(normalize("Nevada (Las Vegas)"), "nevada las vegas");
    }

    #[test]
    fn test_positional_similarity() {
        assert_eq!(positional_similarity("abcd", "abcd"), 1.0);
        assert_eq!(positional_similarity("abcd", "abxd"), 0.75);
        assert_eq!(positional_similarity("", ""), 0.0);
    }

    #[test]
    fn test_shared_across_threads() {
        let r = std::sync::Arc::new(TeamResolver::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let r = std::sync::Arc::clone(&r);
                std::thread::spawn(move || r.resolve("Ball St."))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "Ball State");
        }
    }
}
