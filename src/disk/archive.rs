use std::io::{Cursor, Write};

use bytes::Bytes;
use zip::{CompressionMethod, ZipWriter};
use zip::result::ZipResult;
use zip::write::FileOptions;

pub const ARCHIVE_NAME: &str = "files.zip";

/// writes the entries into an in memory deflated zip archive in the order
/// given. names are expected to already be unique
pub fn build_archive(entries: Vec<(String, Bytes)>) -> ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    Ok(writer.finish()?.into_inner())
}
