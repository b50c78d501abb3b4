use serde::Serialize;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{BoxError, DataSource, ResultsWriter};
use crate::model::{AttachmentResult, ContainerResult, TestResult};

/// Writes results into a flat output directory, one JSON file per
/// result plus raw attachment payloads, named so the report renderer
/// picks them up by convention.
#[derive(Debug, Clone)]
pub struct FileSystemResultsWriter {
    output: PathBuf,
}

impl FileSystemResultsWriter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<(), BoxError> {
        fs::create_dir_all(&self.output)?;
        let file = File::create(self.output.join(file_name))?;
        serde_json::to_writer(&file, value)?;
        Ok(())
    }

    fn remove(&self, file_name: &str) -> Result<(), BoxError> {
        match fs::remove_file(self.output.join(file_name)) {
            // A result that was excluded before being written has no file.
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

impl ResultsWriter for FileSystemResultsWriter {
    fn write_container(&self, container: &ContainerResult) -> Result<(), BoxError> {
        self.write_json(&format!("{}-container.json", container.uuid()), container)
    }

    fn write_test(&self, test: &TestResult) -> Result<(), BoxError> {
        self.write_json(&format!("{}-result.json", test.uuid()), test)
    }

    fn write_attachment(
        &self,
        attachment: &AttachmentResult,
        data: &DataSource,
    ) -> Result<(), BoxError> {
        fs::create_dir_all(&self.output)?;
        let payload = data.read_all()?;
        fs::write(self.output.join(attachment.source()), payload)?;
        Ok(())
    }

    fn remove_test(&self, test: &TestResult) -> Result<(), BoxError> {
        self.remove(&format!("{}-result.json", test.uuid()))
    }

    fn remove_attachment(&self, attachment: &AttachmentResult) -> Result<(), BoxError> {
        self.remove(attachment.source())
    }
}

#[cfg(test)]
mod tests {

    use std::fs;
    use uuid::Uuid;

    use super::{FileSystemResultsWriter, ResultsWriter};
    use crate::io::DataSource;
    use crate::model::{AttachmentResult, TestResult};

    fn temp_output() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spotter-writer-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_written_test_round_trips_through_disk() {
        let output = temp_output();
        let writer = FileSystemResultsWriter::new(&output);
        let test = TestResult::new("case".to_owned());

        writer.write_test(&test).unwrap();

        let path = output.join(format!("{}-result.json", test.uuid()));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["uuid"], test.uuid().to_string());
        assert_eq!(json["name"], "case");
        fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn test_attachment_payload_lands_under_source_name() {
        let output = temp_output();
        let writer = FileSystemResultsWriter::new(&output);
        let attachment = AttachmentResult::new("log".to_owned(), None, Some("txt"));

        writer
            .write_attachment(&attachment, &DataSource::from("hello"))
            .unwrap();

        let written = fs::read(output.join(attachment.source())).unwrap();
        assert_eq!(written, b"hello".to_vec());
        fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn test_removing_a_never_written_attachment_is_fine() {
        let writer = FileSystemResultsWriter::new(temp_output());
        let attachment = AttachmentResult::new("log".to_owned(), None, None);

        assert!(writer.remove_attachment(&attachment).is_ok());
    }
}
