//! Equality-based label selector matching

use std::collections::BTreeMap;

/// Returns true if `labels` satisfy every `key=value` term of `selector`.
///
/// Only the equality form used by the controller is supported; an empty
/// selector matches everything.
#[must_use]
pub fn matches_selector(labels: Option<&BTreeMap<String, String>>, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels
                .and_then(|l| l.get(k.trim()))
                .is_some_and(|actual| actual == v.trim()),
            None => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_all_terms_must_match() {
        let l = labels(&[("app", "scheduler-controller"), ("parent", "nightly")]);
        assert!(matches_selector(Some(&l), "app=scheduler-controller,parent=nightly"));
        assert!(!matches_selector(Some(&l), "app=scheduler-controller,parent=weekly"));
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        assert!(matches_selector(None, ""));
    }

    #[test]
    fn test_missing_labels_do_not_match() {
        assert!(!matches_selector(None, "app=scheduler-controller"));
    }
}
