pub mod mime_type {
    use mime::Mime;
    use serde::Serializer;

    pub fn serialize<S>(mime: &Option<Mime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match mime {
            Some(mime) => {
                let mime_string = mime.to_string();
                serializer.serialize_str(mime_string.as_str())
            }
            None => serializer.serialize_none(),
        }
    }
}

pub mod children {
    use serde::ser::SerializeSeq;
    use serde::Serializer;

    use crate::model::result::{Shared, TestResult};

    /// Containers reference their tests by uuid; the test bodies are
    /// written by their own lifecycle.
    pub fn serialize<S>(children: &[Shared<TestResult>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(children.len()))?;
        for child in children {
            seq.serialize_element(&child.uuid())?;
        }
        seq.end()
    }
}
