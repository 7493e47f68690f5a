// Parsing of `key=value,key=value` option lists handed to the translator.

use std::collections::BTreeMap;

/// Key under which an entry that is not a `key=value` pair is recorded.
pub const ERROR_KEY: &str = "_ERROR_";

/// Parses a comma separated list of `key=value` pairs.
///
/// Within each entry the key is the run of word characters (letters, digits, `_`)
/// directly before the first usable `=`, and the value is everything after it. Entries
/// without such a pair are stored under [`ERROR_KEY`]. A repeated key keeps its last value.
pub fn parse_options(list: &str) -> BTreeMap<String, String> {
    let mut options = BTreeMap::new();
    for entry in list.split(',').filter(|e| !e.is_empty()) {
        match split_pair(entry) {
            Some((key, value)) => {
                options.insert(key.to_string(), value.to_string());
            }
            None => {
                options.insert(ERROR_KEY.to_string(), entry.to_string());
            }
        }
    }
    options
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn split_pair(entry: &str) -> Option<(&str, &str)> {
    for (eq, _) in entry.match_indices('=') {
        let before = &entry[..eq];
        let Some(key_start) = before
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map(|(i, _)| i)
        else {
            continue;
        };
        let value = &entry[eq + 1..];
        if value.is_empty() {
            return None;
        }
        return Some((&before[key_start..], value));
    }
    None
}

/// Whether parsing recorded a malformed entry.
pub fn has_errors(options: &BTreeMap<String, String>) -> bool {
    options.contains_key(ERROR_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_empty_entries() {
        let options = parse_options("lib=Contracts,,whole=true");
        assert_eq!(options.len(), 2);
        assert_eq!(options["lib"], "Contracts");
        assert_eq!(options["whole"], "true");
        assert!(!has_errors(&options));
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let options = parse_options("heap=general,heap=split");
        assert_eq!(options["heap"], "split");
    }

    #[test]
    fn malformed_entries_are_recorded() {
        let options = parse_options("novalue=,justaword");
        assert!(has_errors(&options));
        assert_eq!(options[ERROR_KEY], "justaword");
    }

    #[test]
    fn key_is_the_word_before_equals() {
        let options = parse_options(" stub path=a=b");
        assert_eq!(options["path"], "a=b");

        assert_eq!(parse_options("=x")[ERROR_KEY], "=x");
        assert_eq!(parse_options(" =x y=z")["y"], "z");
    }
}
