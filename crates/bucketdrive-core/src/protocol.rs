//! The backend wire protocol: routes, response envelope, content decoding.
//!
//! Everything that understands the backend's JSON shape lives here. The
//! envelope is parsed into tagged variants at the boundary; shape mismatches
//! become [`DriveError::Malformed`] instead of leaking undefined fields
//! downstream.
//!
//! Envelope, all routes: either an `error` field (failure) or a `type` field
//! (`"file"` | `"directory"`) plus a `content` payload shaped per type.
//! File content arrives as a base64 string with embedded newlines.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DriveError, DriveResult};
use crate::model::EntryType;

/// Fetch file or directory: `GET <base>/files/<path>`.
pub const ROUTE_FILES: &str = "files";
/// Create untitled file/directory: `POST <base>/new`.
pub const ROUTE_NEW: &str = "new";
/// Delete: `DELETE <base>/delete/<path>`.
pub const ROUTE_DELETE: &str = "delete";
/// Rename: `POST <base>/move`.
pub const ROUTE_MOVE: &str = "move";
/// Persist content: `POST <base>/upload/<path>`.
pub const ROUTE_UPLOAD: &str = "upload";
/// Copy: `POST <base>/copy`.
pub const ROUTE_COPY: &str = "copy";

/// One child row in a directory listing, as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChild {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Earlier protocol revisions report a lower-trust writability flag;
    /// absent means writable.
    #[serde(default)]
    pub writable: Option<bool>,
}

/// Successful file response body.
#[derive(Debug, Clone, Deserialize)]
pub struct FileResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    /// Base64 with embedded newlines; decode via [`decode_file_content`].
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Successful directory response body.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Children in backend order. Order is preserved, never sorted.
    #[serde(default)]
    pub content: Vec<RawChild>,
}

/// A parsed, shape-checked backend response.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    File(FileResponse),
    Directory(DirectoryResponse),
}

/// Parse a raw JSON body into a tagged response.
///
/// An `error` field short-circuits: the rest of the body is not interpreted
/// and the error value is returned verbatim. Anything that is neither an
/// error nor a well-shaped file/directory is a malformed response.
pub fn parse_envelope(mut body: Value) -> DriveResult<BackendResponse> {
    if let Some(error) = body.get_mut("error") {
        return Err(DriveError::Backend(error.take()));
    }
    let tag = body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DriveError::malformed("response has neither 'error' nor 'type'"))?;
    match tag {
        "file" => serde_json::from_value(body)
            .map(BackendResponse::File)
            .map_err(|e| DriveError::malformed(format!("bad file response: {e}"))),
        "directory" => serde_json::from_value(body)
            .map(BackendResponse::Directory)
            .map_err(|e| DriveError::malformed(format!("bad directory response: {e}"))),
        other => Err(DriveError::malformed(format!(
            "unknown entry type '{other}'"
        ))),
    }
}

/// Convert a child row's `type` tag, rejecting anything unrecognized.
pub fn entry_type_from_tag(tag: &str) -> DriveResult<EntryType> {
    match tag {
        "file" => Ok(EntryType::File),
        "directory" => Ok(EntryType::Directory),
        other => Err(DriveError::malformed(format!(
            "unknown entry type '{other}'"
        ))),
    }
}

/// Decode a backend file payload into UTF-8 text.
///
/// The backend interleaves newline characters into the base64 stream at
/// arbitrary byte boundaries; strip them all before decoding.
pub fn decode_file_content(encoded: &str) -> DriveResult<String> {
    let compact: String = encoded.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| DriveError::Decode(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| DriveError::Decode(format!("not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_short_circuits() {
        // The rest of the body is garbage on purpose; it must not be touched.
        let body = json!({"error": {"code": 403, "message": "denied"}, "type": 17});
        match parse_envelope(body) {
            Err(DriveError::Backend(v)) => {
                assert_eq!(v, json!({"code": 403, "message": "denied"}));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_type_is_malformed() {
        assert!(matches!(
            parse_envelope(json!({"content": "x"})),
            Err(DriveError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        assert!(matches!(
            parse_envelope(json!({"type": "symlink", "content": "x"})),
            Err(DriveError::Malformed(_))
        ));
    }

    #[test]
    fn test_directory_children_preserve_order() {
        let body = json!({
            "type": "directory",
            "content": [
                {"name": "z.txt", "path": "d/z.txt", "type": "file"},
                {"name": "a", "path": "d/a", "type": "directory"},
                {"name": "m.txt", "path": "d/m.txt", "type": "file"},
            ]
        });
        let BackendResponse::Directory(dir) = parse_envelope(body).unwrap() else {
            panic!("expected directory");
        };
        let names: Vec<&str> = dir.content.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["z.txt", "a", "m.txt"]);
    }

    #[test]
    fn test_decode_plain_base64() {
        assert_eq!(decode_file_content("aGVsbG8=").unwrap(), "hello");
    }

    #[test]
    fn test_decode_with_interspersed_newlines() {
        // Newlines at arbitrary boundaries inside the base64 alphabet.
        let encoded = "aGVs\nbG8s\r\nIHdv\ncmxk\nIQ==\n";
        assert_eq!(decode_file_content(encoded).unwrap(), "hello, world!");
    }

    #[test]
    fn test_decode_newline_every_char() {
        let plain = "aGVsbG8=";
        let shredded: String = plain.chars().flat_map(|c| [c, '\n']).collect();
        assert_eq!(decode_file_content(&shredded).unwrap(), "hello");
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(matches!(
            decode_file_content("!!not base64!!"),
            Err(DriveError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        // 0xFF 0xFE is not valid UTF-8.
        let encoded = BASE64.encode([0xFF, 0xFE]);
        assert!(matches!(
            decode_file_content(&encoded),
            Err(DriveError::Decode(_))
        ));
    }

    #[test]
    fn test_entry_type_tags() {
        assert_eq!(entry_type_from_tag("file").unwrap(), EntryType::File);
        assert_eq!(
            entry_type_from_tag("directory").unwrap(),
            EntryType::Directory
        );
        assert!(entry_type_from_tag("bucket").is_err());
    }
}
