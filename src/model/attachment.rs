use mime::Mime;
use serde_derive::Serialize;
use uuid::Uuid;

use super::result::{ResultItem, ResultKind, ResultNode};

/// A named artifact (screenshot, log, payload dump) attached to the
/// execution context that was current when it was added. Unlike the
/// other results it has no start/stop protocol: it is created and
/// written in one operation.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResult {
    #[serde(skip)]
    uuid: Uuid,
    name: String,
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        with = "crate::model::serialize::mime_type"
    )]
    r#type: Option<Mime>,
    source: String,
    #[serde(skip)]
    file_extension: Option<String>,
    #[serde(skip)]
    excluded: bool,
    #[serde(skip)]
    muted: bool,
}

impl AttachmentResult {
    pub fn new(name: String, r#type: Option<Mime>, file_extension: Option<&str>) -> Self {
        Self::with_uuid(Uuid::new_v4(), name, r#type, file_extension)
    }

    pub fn with_uuid(
        uuid: Uuid,
        name: String,
        r#type: Option<Mime>,
        file_extension: Option<&str>,
    ) -> Self {
        let file_extension = file_extension
            .map(|extension| extension.trim_start_matches('.'))
            .filter(|extension| !extension.is_empty())
            .map(str::to_owned);
        let source = match &file_extension {
            Some(extension) => format!("{}-attachment.{}", uuid, extension),
            None => format!("{}-attachment", uuid),
        };
        Self {
            uuid,
            name,
            r#type,
            source,
            file_extension,
            excluded: false,
            muted: false,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> Option<&Mime> {
        self.r#type.as_ref()
    }

    /// File name the payload is stored under, derived from the uuid and
    /// the extension.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_extension(&self) -> Option<&str> {
        self.file_extension.as_deref()
    }
}

impl ResultItem for AttachmentResult {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Attachment
    }

    fn excluded(&self) -> bool {
        self.excluded
    }

    fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn nested_results(&self) -> Vec<ResultNode> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {

    use super::AttachmentResult;
    use uuid::Uuid;

    #[test]
    fn test_source_is_derived_from_uuid_and_extension() {
        let uuid = Uuid::new_v4();
        let attachment =
            AttachmentResult::with_uuid(uuid, "screenshot".to_owned(), None, Some(".png"));

        assert_eq!(
            attachment.source(),
            format!("{}-attachment.png", uuid).as_str()
        );
        assert_eq!(attachment.file_extension(), Some("png"));
    }

    #[test]
    fn test_source_without_extension_has_no_trailing_dot() {
        let uuid = Uuid::new_v4();
        let attachment = AttachmentResult::with_uuid(uuid, "log".to_owned(), None, None);

        assert_eq!(attachment.source(), format!("{}-attachment", uuid).as_str());
    }
}
