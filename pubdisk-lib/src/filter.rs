use crate::fs::FileRecord;

const DOCUMENT_MIMES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const IMAGE_MIMES: [&str; 3] = [
    "image/jpeg",
    "image/png",
    "image/gif",
];

/// named groups of mime types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeGroup {
    Documents,
    Images,
}

impl MimeGroup {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "documents" => Some(MimeGroup::Documents),
            "images" => Some(MimeGroup::Images),
            _ => None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MimeGroup::Documents => "documents",
            MimeGroup::Images => "images",
        }
    }

    pub fn mime_types(&self) -> &'static [&'static str] {
        match self {
            MimeGroup::Documents => &DOCUMENT_MIMES,
            MimeGroup::Images => &IMAGE_MIMES,
        }
    }

    pub fn contains(&self, mime_type: &str) -> bool {
        self.mime_types().contains(&mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSelector {
    All,
    Media(String),
    Group(MimeGroup),
}

impl FilterSelector {
    /// coarse selector matched against `media_type`. empty means no filter
    pub fn media<M>(media_type: M) -> Self
    where
        M: Into<String>
    {
        let media_type = media_type.into();

        if media_type.is_empty() {
            FilterSelector::All
        } else {
            FilterSelector::Media(media_type)
        }
    }

    /// named group selector. an unknown group does not filter anything
    pub fn group(name: &str) -> Self {
        match MimeGroup::from_name(name) {
            Some(group) => FilterSelector::Group(group),
            None => FilterSelector::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterSelector::All)
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        match self {
            FilterSelector::All => true,
            FilterSelector::Media(media_type) => record.media_type.as_deref() == Some(media_type.as_str()),
            FilterSelector::Group(group) => match record.mime_type.as_deref() {
                Some(mime_type) => group.contains(mime_type),
                None => false
            }
        }
    }

    /// string used to tell cached listings apart. groups are prefixed so a
    /// media type that happens to share a group name gets its own entry
    pub fn key_fragment(&self) -> String {
        match self {
            FilterSelector::All => String::new(),
            FilterSelector::Media(media_type) => media_type.clone(),
            FilterSelector::Group(group) => format!("group:{}", group.name()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FilterSelector::All => "",
            FilterSelector::Media(media_type) => media_type.as_str(),
            FilterSelector::Group(group) => group.name(),
        }
    }
}

impl Default for FilterSelector {
    fn default() -> Self {
        FilterSelector::All
    }
}

/// keeps the records matching the selector, input order preserved
pub fn filter<I>(records: I, selector: &FilterSelector) -> Vec<FileRecord>
where
    I: IntoIterator<Item = FileRecord>
{
    records.into_iter()
        .filter(|record| selector.matches(record))
        .collect()
}
