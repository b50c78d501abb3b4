use serde_derive::Serialize;

/// A reported argument of a test or step. The `hidden` and `excluded`
/// flags only affect report presentation and history matching; they have
/// nothing to do with result exclusion.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    name: String,
    value: String,
    hidden: bool,
    excluded: bool,
}

impl Parameter {
    pub fn new(name: String, value: String) -> Self {
        Self {
            name,
            value,
            hidden: false,
            excluded: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}
