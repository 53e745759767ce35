//! Completion helpers for the command layer.
//!
//! Everything here is pure: no repository is consulted and nothing is
//! retained between calls.

use std::marker::PhantomData;

/// Closed set of values with a canonical upper-case name each.
pub trait Enumerated: Copy + Send + Sync + 'static {
    /// All values, in the order they should be offered.
    fn variants() -> &'static [Self];

    fn canonical_name(&self) -> &'static str;
}

/// Produces completion candidates for the current partial input.
pub trait Suggest: Send + Sync {
    fn suggest(&self, input: &str) -> Vec<String>;
}

/// Free-form argument: always offers the same hint.
#[derive(Debug, Clone)]
pub struct Placeholder {
    label: String,
}

pub fn placeholder(label: impl Into<String>) -> Placeholder {
    Placeholder {
        label: label.into(),
    }
}

impl Suggest for Placeholder {
    fn suggest(&self, _input: &str) -> Vec<String> {
        vec![self.label.clone()]
    }
}

/// Offers the variants of `E` whose name starts with the typed prefix.
/// With nothing typed, the placeholder hint leads the list.
#[derive(Debug, Clone)]
pub struct EnumValues<E> {
    placeholder: String,
    _values: PhantomData<fn() -> E>,
}

pub fn enumerated_values<E: Enumerated>(placeholder: impl Into<String>) -> EnumValues<E> {
    EnumValues {
        placeholder: placeholder.into(),
        _values: PhantomData,
    }
}

impl<E: Enumerated> Suggest for EnumValues<E> {
    fn suggest(&self, input: &str) -> Vec<String> {
        let prefix = input.trim().to_uppercase();
        let mut out = Vec::with_capacity(E::variants().len() + 1);

        if prefix.is_empty() {
            out.push(self.placeholder.clone());
        }

        out.extend(
            E::variants()
                .iter()
                .map(Enumerated::canonical_name)
                .filter(|name| name.starts_with(&prefix))
                .map(str::to_string),
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Status {
        Active,
        Inactive,
    }

    impl Enumerated for Status {
        fn variants() -> &'static [Self] {
            &[Status::Active, Status::Inactive]
        }

        fn canonical_name(&self) -> &'static str {
            match self {
                Status::Active => "ACTIVE",
                Status::Inactive => "INACTIVE",
            }
        }
    }

    #[test]
    fn empty_prefix_leads_with_placeholder() {
        let suggester = enumerated_values::<Status>("<status>");
        assert_eq!(suggester.suggest(""), vec!["<status>", "ACTIVE", "INACTIVE"]);
        assert_eq!(suggester.suggest("   "), vec!["<status>", "ACTIVE", "INACTIVE"]);
    }

    #[test]
    fn prefix_match_is_case_insensitive_and_drops_placeholder() {
        let suggester = enumerated_values::<Status>("<status>");
        assert_eq!(suggester.suggest("in"), vec!["INACTIVE"]);
        assert_eq!(suggester.suggest(" Act"), vec!["ACTIVE"]);
        assert!(suggester.suggest("x").is_empty());
    }

    #[test]
    fn repeated_calls_are_independent() {
        let suggester = enumerated_values::<Status>("<status>");
        let first = suggester.suggest("a");
        let second = suggester.suggest("a");
        assert_eq!(first, second);
    }

    #[test]
    fn placeholder_ignores_input() {
        let suggester = placeholder("<company>");
        assert_eq!(suggester.suggest(""), vec!["<company>"]);
        assert_eq!(suggester.suggest("acme"), vec!["<company>"]);
    }
}
