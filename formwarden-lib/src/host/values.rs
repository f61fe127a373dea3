//! Serialized form values and file attachments

use serde::Deserialize;
use serde::Serialize;
use serde::ser::SerializeMap;

/// A file attached to a file input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// The original file name.
    pub file_name: String,
    /// The MIME type of the file, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// The file content.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    /// Creates a new attachment.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Sets the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A snapshot of every field in a form.
///
/// Field order follows the form's document order. Serializes to a JSON
/// object of `name -> value`; attachments are carried alongside and only
/// sent by the submit helper.
///
/// # Example
///
/// ```
/// use formwarden_lib::host::FormValues;
///
/// let values: FormValues = [("email", "a@b.com")].into_iter().collect();
/// assert_eq!(values.get("email"), Some("a@b.com"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    fields: Vec<(String, String)>,
    files: Vec<(String, FileAttachment)>,
}

impl FormValues {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Attaches a file to a field.
    pub fn attach(&mut self, name: impl Into<String>, file: FileAttachment) {
        self.files.push((name.into(), file));
    }

    /// Returns a field's value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the files attached to a field.
    pub fn files_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileAttachment> + 'a {
        self.files
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterates over `(name, file)` pairs in attachment order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileAttachment)> {
        self.files.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl Serialize for FormValues {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut values = FormValues::new();
        values.insert("a", "1");
        values.insert("b", "2");
        values.insert("a", "3");

        let pairs: Vec<_> = values.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_serializes_as_object() {
        let values: FormValues = [("email", "a@b.com"), ("name", "Ana")].into_iter().collect();
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"email":"a@b.com","name":"Ana"}"#);
    }

    #[test]
    fn test_files_of_field() {
        let mut values = FormValues::new();
        values.insert("avatar", "me.png");
        values.attach("avatar", FileAttachment::new("me.png", vec![1, 2, 3]));
        values.attach("other", FileAttachment::new("x.txt", Vec::new()));

        let files: Vec<_> = values.files_of("avatar").collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].len(), 3);
    }
}
