//! Contracts the lifecycle depends on: time, durable result storage,
//! attachment payloads and error reporting. Everything here is
//! synchronous; implementations signal failure through `Result` and the
//! lifecycle decides what to do with it.

mod writer;

pub use self::writer::FileSystemResultsWriter;

use chrono::Utc;
use std::error::Error as StdError;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::model::{AttachmentResult, ContainerResult, TestResult};

/// Failure raised by a collaborator (clock, writer, update callback).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Supplies result timestamps as unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<i64, BoxError>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<i64, BoxError> {
        Ok(Utc::now().timestamp_millis())
    }
}

/// Opaque attachment payload, handed through to the writer without being
/// inspected by the lifecycle.
#[derive(Debug, Clone)]
pub enum DataSource {
    Bytes(Vec<u8>),
    Text(String),
    File(PathBuf),
}

impl DataSource {
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        match self {
            DataSource::Bytes(data) => Ok(data.clone()),
            DataSource::Text(text) => Ok(text.clone().into_bytes()),
            DataSource::File(path) => fs::read(path),
        }
    }
}

impl From<Vec<u8>> for DataSource {
    fn from(data: Vec<u8>) -> Self {
        DataSource::Bytes(data)
    }
}

impl From<String> for DataSource {
    fn from(text: String) -> Self {
        DataSource::Text(text)
    }
}

impl From<&str> for DataSource {
    fn from(text: &str) -> Self {
        DataSource::Text(text.to_owned())
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        DataSource::File(path)
    }
}

/// Persists finished results and removes results that were excluded
/// after having been (or instead of being) written.
pub trait ResultsWriter: Send + Sync {
    fn write_container(&self, container: &ContainerResult) -> Result<(), BoxError>;
    fn write_test(&self, test: &TestResult) -> Result<(), BoxError>;
    fn write_attachment(
        &self,
        attachment: &AttachmentResult,
        data: &DataSource,
    ) -> Result<(), BoxError>;
    fn remove_test(&self, test: &TestResult) -> Result<(), BoxError>;
    fn remove_attachment(&self, attachment: &AttachmentResult) -> Result<(), BoxError>;
}

/// Values substituted into an error record's message template, plus the
/// causing error when there is one. Integrations asserting on lifecycle
/// diagnostics rely on this exact shape.
pub struct ErrorContext<'a> {
    pub fields: Vec<(&'static str, Option<String>)>,
    pub exception: Option<&'a (dyn StdError + Send + Sync)>,
}

impl ErrorContext<'_> {
    /// Replaces every `{key}` placeholder with its field value, `<null>`
    /// when the value is absent.
    pub fn render(&self, template: &str) -> String {
        let mut message = template.to_owned();
        for (key, value) in &self.fields {
            let placeholder = format!("{{{}}}", key);
            message = message.replace(placeholder.as_str(), value.as_deref().unwrap_or("<null>"));
        }
        message
    }
}

/// Error reporting contract the lifecycle logs through. Templates carry
/// named placeholders (`"Container (UUID: {uuid}) not started"`); the
/// context carries the values and the caught error.
pub trait Logger: Send + Sync {
    fn error(&self, template: &str, context: &ErrorContext<'_>);
}

/// Renders records through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardLogger;

impl Logger for StandardLogger {
    fn error(&self, template: &str, context: &ErrorContext<'_>) {
        let message = context.render(template);
        match context.exception {
            Some(exception) => error!("{}: {}", message, exception),
            None => error!("{}", message),
        }
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn error(&self, _template: &str, _context: &ErrorContext<'_>) {}
}

/// Panics on the first record. For tests that must not touch any
/// lifecycle error path.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictLogger;

impl Logger for StrictLogger {
    fn error(&self, template: &str, context: &ErrorContext<'_>) {
        match context.exception {
            Some(exception) => panic!(
                "unexpected error record: {} ({})",
                context.render(template),
                exception
            ),
            None => panic!("unexpected error record: {}", context.render(template)),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::{DataSource, ErrorContext};

    #[test]
    fn test_render_substitutes_fields() {
        let context = ErrorContext {
            fields: vec![("uuid", Some("abc".to_owned()))],
            exception: None,
        };

        assert_eq!(
            context.render("Test (UUID: {uuid}) not stopped"),
            "Test (UUID: abc) not stopped"
        );
    }

    #[test]
    fn test_render_replaces_missing_value_with_null_marker() {
        let context = ErrorContext {
            fields: vec![("uuid", None)],
            exception: None,
        };

        assert_eq!(
            context.render("Container (UUID: {uuid}) not started"),
            "Container (UUID: <null>) not started"
        );
    }

    #[test]
    fn test_data_source_reads_text_as_bytes() {
        let data = DataSource::from("payload");

        assert_eq!(data.read_all().unwrap(), b"payload".to_vec());
    }
}
