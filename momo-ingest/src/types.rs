use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container format of an SMS export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// `<smses><sms body=".." date=".." address=".."/></smses>` backup
    Xml,
    /// JSON array of `{ "body", "date", "address" }` objects
    Json,
}

impl SourceFormat {
    /// Pick the format from the file extension; anything but `.json` is XML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Xml,
        }
    }
}
