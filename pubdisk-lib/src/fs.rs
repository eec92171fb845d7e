use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Dir,
}

impl Default for ResourceKind {
    fn default() -> Self {
        ResourceKind::File
    }
}

/// one item of a public resource listing
///
/// only `media_type` and `mime_type` are interpreted, everything else is
/// carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub kind: ResourceKind,
    pub media_type: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<String>
    {
        let path = path.into();
        let name = basename(&path).to_owned();

        FileRecord {
            path,
            name,
            kind: ResourceKind::File,
            media_type: None,
            mime_type: None,
            size: None,
            created: None,
            modified: None,
        }
    }

    pub fn with_media_type<M>(mut self, media_type: M) -> Self
    where
        M: Into<String>
    {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_mime_type<M>(mut self, mime_type: M) -> Self
    where
        M: Into<String>
    {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind == ResourceKind::File
    }
}

/// shape of an item as the hosting service sends it. the name is optional
/// there since it can always be recovered from the path
#[derive(Deserialize)]
struct RawRecord {
    path: String,
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: ResourceKind,
    media_type: Option<String>,
    mime_type: Option<String>,
    size: Option<u64>,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
}

impl<'de> Deserialize<'de> for FileRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>
    {
        let raw = RawRecord::deserialize(deserializer)?;
        let name = match raw.name {
            Some(name) if !name.is_empty() => name,
            _ => basename(&raw.path).to_owned(),
        };

        Ok(FileRecord {
            path: raw.path,
            name,
            kind: raw.kind,
            media_type: raw.media_type,
            mime_type: raw.mime_type,
            size: raw.size,
            created: raw.created,
            modified: raw.modified,
        })
    }
}

/// final segment of a resource path after the last `/`
///
/// a trailing slash is ignored so "docs/" gives "docs". a path with no
/// segments at all gives back the path as is.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');

    match trimmed.rsplit_once('/') {
        Some((_, name)) => name,
        None => if trimmed.is_empty() {
            path
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basename_of_paths() {
        let cases = [
            ("docs/report.pdf", "report.pdf"),
            ("/report.pdf", "report.pdf"),
            ("report.pdf", "report.pdf"),
            ("/a/b/c/", "c"),
            ("disk:/photos/cat.png", "cat.png"),
            ("/", "/"),
        ];

        for (given, expected) in cases {
            assert_eq!(basename(given), expected, "path {:?}", given);
        }
    }

    #[test]
    fn deserialize_upstream_item() {
        let json = r#"{
            "path": "/photos/cat.png",
            "name": "cat.png",
            "type": "file",
            "media_type": "image",
            "mime_type": "image/png",
            "size": 2048,
            "created": "2023-04-01T10:00:00+00:00",
            "modified": "2023-04-02T11:30:00+03:00",
            "preview": "https://example.com/preview",
            "md5": "d41d8cd98f00b204e9800998ecf8427e"
        }"#;

        let record: FileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.path, "/photos/cat.png");
        assert_eq!(record.name, "cat.png");
        assert_eq!(record.kind, ResourceKind::File);
        assert_eq!(record.media_type.as_deref(), Some("image"));
        assert_eq!(record.mime_type.as_deref(), Some("image/png"));
        assert_eq!(record.size, Some(2048));
        assert!(record.modified.is_some());
    }

    #[test]
    fn deserialize_derives_missing_name() {
        let json = r#"{"path": "/docs/report.pdf", "type": "file"}"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.name, "report.pdf");
        assert!(record.media_type.is_none());
        assert!(record.mime_type.is_none());
    }

    #[test]
    fn deserialize_directory() {
        let json = r#"{"path": "/docs", "name": "docs", "type": "dir"}"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();

        assert!(!record.is_file());
    }
}
