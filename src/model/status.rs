use serde_derive::Serialize;

/// Outcome of a test, fixture or step. The engine never decides this
/// itself; integrations set it through update callbacks.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Failed,
    Broken,
    Passed,
    Skipped,
}

#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

impl StatusDetails {
    pub fn new(message: String, trace: Option<String>) -> Self {
        Self { message, trace }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

impl From<String> for StatusDetails {
    fn from(message: String) -> Self {
        Self {
            message,
            trace: None,
        }
    }
}
