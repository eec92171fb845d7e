use std::collections::HashMap;
use std::path::Path;

use mime::Mime;
use lazy_static::lazy_static;

lazy_static! {
    static ref EXT_MIME_MAP: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // images
        m.insert("jpg", "image/jpeg");
        m.insert("jpeg", "image/jpeg");
        m.insert("png", "image/png");
        m.insert("gif", "image/gif");
        m.insert("svg", "image/svg+xml");
        m.insert("webp", "image/webp");

        // documents
        m.insert("pdf", "application/pdf");
        m.insert("doc", "application/msword");
        m.insert("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        m.insert("txt", "text/plain");
        m.insert("csv", "text/csv");
        m.insert("html", "text/html");
        m.insert("json", "application/json");

        // media
        m.insert("mp3", "audio/mpeg");
        m.insert("mp4", "video/mp4");

        // archives
        m.insert("zip", "application/zip");
        m
    };
}

/// guesses a content type from the extension of a file name, falling back to
/// octet-stream
pub fn mime_from_name(name: &str) -> Mime {
    let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
        return mime::APPLICATION_OCTET_STREAM;
    };

    EXT_MIME_MAP.get(ext.to_ascii_lowercase().as_str())
        .and_then(|mime_str| mime_str.parse().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
