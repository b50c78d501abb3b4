use serde_derive::Serialize;
use std::fmt;

/// A name/value pair attached to a test, used by the report to group and
/// filter results. Well-known names get a constructor each; anything else
/// goes through [`Label::new`].
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    name: String,
    value: String,
}

impl Label {
    pub fn new(name: String, value: String) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn id(value: String) -> Self {
        Self::new("AS_ID".to_owned(), value)
    }

    pub fn suite(value: String) -> Self {
        Self::new("suite".to_owned(), value)
    }

    pub fn parent_suite(value: String) -> Self {
        Self::new("parentSuite".to_owned(), value)
    }

    pub fn sub_suite(value: String) -> Self {
        Self::new("subSuite".to_owned(), value)
    }

    pub fn epic(value: String) -> Self {
        Self::new("epic".to_owned(), value)
    }

    pub fn feature(value: String) -> Self {
        Self::new("feature".to_owned(), value)
    }

    pub fn story(value: String) -> Self {
        Self::new("story".to_owned(), value)
    }

    pub fn severity(value: Severity) -> Self {
        Self::new("severity".to_owned(), value.to_string())
    }

    pub fn tag(value: String) -> Self {
        Self::new("tag".to_owned(), value)
    }

    pub fn owner(value: String) -> Self {
        Self::new("owner".to_owned(), value)
    }

    pub fn lead(value: String) -> Self {
        Self::new("lead".to_owned(), value)
    }

    pub fn host(value: String) -> Self {
        Self::new("host".to_owned(), value)
    }

    pub fn thread(value: String) -> Self {
        Self::new("thread".to_owned(), value)
    }

    pub fn test_method(value: String) -> Self {
        Self::new("testMethod".to_owned(), value)
    }

    pub fn test_class(value: String) -> Self {
        Self::new("testClass".to_owned(), value)
    }

    pub fn package(value: String) -> Self {
        Self::new("package".to_owned(), value)
    }

    pub fn framework(value: String) -> Self {
        Self::new("framework".to_owned(), value)
    }

    pub fn language(value: String) -> Self {
        Self::new("language".to_owned(), value)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Blocker,
    Critical,
    Normal,
    Minor,
    Trivial,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Normal
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Blocker => "blocker",
            Severity::Critical => "critical",
            Severity::Normal => "normal",
            Severity::Minor => "minor",
            Severity::Trivial => "trivial",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {

    use super::{Label, Severity};

    #[test]
    fn test_severity_label_value() {
        let label = Label::severity(Severity::Critical);

        assert_eq!(label.name(), "severity");
        assert_eq!(label.value(), "critical");
    }
}
