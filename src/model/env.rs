use lazy_static::*;
use regex::Regex;
use std::collections::HashMap;

use super::label::Label;

lazy_static! {
    static ref ENV_LABEL_REGEX: Regex =
        Regex::new(r"^ALLURE_LABEL_(?P<name>.+)$").expect("Regex compilation error");
}

/// Derives result labels from `ALLURE_LABEL_<name>` environment
/// variables, so CI jobs can tag every test of a run without touching
/// the test code.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    env: HashMap<String, String>,
}

impl EnvProvider {
    pub fn new(env: HashMap<String, String>) -> Self {
        Self { env }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::vars().collect())
    }

    /// One label per matching variable, name lowercased, sorted by name.
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .env
            .iter()
            .filter_map(|(key, value)| {
                ENV_LABEL_REGEX
                    .captures(key)
                    .and_then(|captures| captures.name("name"))
                    .map(|name| Label::new(name.as_str().to_lowercase(), value.clone()))
            })
            .collect();
        labels.sort_by(|left, right| left.name().cmp(right.name()));
        labels
    }
}

#[cfg(test)]
mod tests {

    use std::collections::HashMap;

    use super::EnvProvider;

    fn env(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn test_prefixed_variables_become_labels() {
        let provider = EnvProvider::new(env(&[
            ("ALLURE_LABEL_OWNER", "qa-team"),
            ("ALLURE_LABEL_Epic", "checkout"),
            ("PATH", "/usr/bin"),
        ]));

        let labels = provider.labels();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name(), "epic");
        assert_eq!(labels[0].value(), "checkout");
        assert_eq!(labels[1].name(), "owner");
        assert_eq!(labels[1].value(), "qa-team");
    }

    #[test]
    fn test_bare_prefix_is_ignored() {
        let provider = EnvProvider::new(env(&[("ALLURE_LABEL_", "nameless")]));

        assert!(provider.labels().is_empty());
    }

    #[test]
    fn test_empty_environment_yields_no_labels() {
        assert!(EnvProvider::default().labels().is_empty());
    }
}
