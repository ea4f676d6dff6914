//! HTML rendering for folder listings.

use chrono::{DateTime, Utc};
use html_escape::encode_text;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt::Write;
use std::time::SystemTime;

use crate::storage::FileEntry;

/// Characters escaped inside path segments of listing hrefs. Covers URL
/// delimiters as well as the HTML-attribute characters, so encoded
/// segments can be embedded in `href="..."` directly.
const SEGMENT_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'/')
    .add(b'\\');

const PAGE_STYLE: &str ="body{font-family:system-ui;margin:2rem;}\
table{border-collapse:collapse;}\
th,td{padding:0.25rem 1.5rem 0.25rem 0;text-align:left;}\
th{border-bottom:1px solid #ddd;}\
td.num{text-align:right;}";

// Drag-and-drop upload: dropped files POST to the current path; on a 409
// the user may confirm an overwrite, which retries the file as PUT.
const UPLOAD_SCRIPT: &str = r#"
document.addEventListener('dragover', (event) => event.preventDefault());
document.addEventListener('drop', handleDrop);

async function handleDrop(event) {
	event.preventDefault();
	for (let file of event.dataTransfer.files) {
		await uploadFile(file);
	}
	location.reload();
}

async function uploadFile(file, method) {
	const formData = new FormData();
	formData.append("file", file, file.name);

	const res = await fetch(location.pathname, {
		method: method || 'POST',
		body: formData,
	});

	if (res.status === 409) {
		if (confirm(`${file.name} already exists. Overwrite?`)) {
			await uploadFile(file, 'PUT');
		}
	}
}
"#;

/// Renders folder listings. Constructed once at startup and handed to the
/// request handler.
#[derive(Clone, Debug)]
pub struct Renderer {
    uploads_enabled: bool,
}

impl Renderer {
    pub fn new(uploads_enabled: bool) -> Self {
        Self { uploads_enabled }
    }

    /// Produces the listing page for `logical_path`. Entries are rendered
    /// in the order given.
    pub fn folder_listing(&self, logical_path: &str, entries: &[FileEntry]) -> String {
        let title = encode_text(logical_path);
        let mut page = String::with_capacity(1024 + entries.len() * 128);
        let _ = write!(
            page,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Index of {title}</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n\
             <h1>Index of {title}</h1>\n\
             <table>\n<tr><th>Name</th><th>Size</th><th>Modified</th></tr>\n"
        );

        if logical_path != "/" {
            // Relative `..` misresolves against a slash-less base, so the
            // parent href is spelled out from the logical path.
            let parent = encode_path(parent_path(logical_path));
            let _ = write!(
                page,
                "<tr><td><a href=\"{parent}\">../</a></td><td></td><td></td></tr>\n"
            );
        }

        let base = encode_path(logical_path.trim_end_matches('/'));
        for entry in entries {
            let href = utf8_percent_encode(&entry.name, SEGMENT_ENCODE);
            let display = encode_text(&entry.name);
            let suffix = if entry.is_dir { "/" } else { "" };
            let size = if entry.is_dir {
                "-".to_string()
            } else {
                format_bytes(entry.size)
            };
            let modified = entry
                .modified
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(
                page,
                "<tr><td><a href=\"{base}/{href}{suffix}\">{display}{suffix}</a></td>\
                 <td class=\"num\">{size}</td><td>{modified}</td></tr>\n"
            );
        }

        page.push_str("</table>\n");
        if self.uploads_enabled {
            page.push_str("<p>Drop files anywhere to upload them here.</p>\n<script>");
            page.push_str(UPLOAD_SCRIPT);
            page.push_str("</script>\n");
        }
        page.push_str("</body>\n</html>\n");
        page
    }
}

/// Percent-encodes each segment of a logical path for use in an href.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT_ENCODE).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Logical path of the parent directory; the root is its own parent.
fn parent_path(logical_path: &str) -> &str {
    match logical_path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

/// Formats a byte count with binary K/M/G suffixes: plain integer below
/// 1024, one decimal place above.
pub fn format_bytes(bytes: u64) -> String {
    const KILO: u64 = 1 << 10;
    const MEGA: u64 = 1 << 20;
    const GIGA: u64 = 1 << 30;

    match bytes {
        _ if bytes >= GIGA => format!("{:.1}G", bytes as f64 / GIGA as f64),
        _ if bytes >= MEGA => format!("{:.1}M", bytes as f64 / MEGA as f64),
        _ if bytes >= KILO => format!("{:.1}K", bytes as f64 / KILO as f64),
        _ => bytes.to_string(),
    }
}

/// Formats a modification time for the listing.
pub fn format_timestamp(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn format_bytes_thresholds() {
        assert_eq!(format_bytes(0), "0");
        assert_eq!(format_bytes(512), "512");
        assert_eq!(format_bytes(1023), "1023");
        assert_eq!(format_bytes(2048), "2.0K");
        assert_eq!(format_bytes(5_000_000), "4.8M");
        assert_eq!(format_bytes(3 * (1 << 30)), "3.0G");
    }

    #[test]
    fn format_timestamp_is_fixed_utc() {
        let time = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(format_timestamp(time), "2023-11-14 22:13:20");
    }

    #[test]
    fn listing_escapes_entry_names() {
        let renderer = Renderer::new(false);
        let entries = [FileEntry {
            name: "<b>.txt".to_string(),
            is_dir: false,
            size: 1,
            modified: None,
        }];
        let page = renderer.folder_listing("/", &entries);
        assert!(page.contains("&lt;b&gt;.txt"));
        assert!(!page.contains("<b>.txt"));
    }

    #[test]
    fn listing_links_join_the_logical_path() {
        let renderer = Renderer::new(false);
        let entries = [FileEntry {
            name: "notes.txt".to_string(),
            is_dir: false,
            size: 10,
            modified: None,
        }];
        let page = renderer.folder_listing("/docs", &entries);
        assert!(page.contains("href=\"/docs/notes.txt\""));

        let page = renderer.folder_listing("/", &entries);
        assert!(page.contains("href=\"/notes.txt\""));
    }

    #[test]
    fn listing_marks_directories_and_parent_link() {
        let renderer = Renderer::new(false);
        let entries = [FileEntry {
            name: "sub".to_string(),
            is_dir: true,
            size: 0,
            modified: None,
        }];
        let root = renderer.folder_listing("/", &entries);
        assert!(root.contains(">sub/</a>"));
        assert!(!root.contains(">../</a>"));

        let nested = renderer.folder_listing("/docs", &entries);
        assert!(nested.contains(">../</a>"));
    }

    #[test]
    fn parent_link_targets_the_immediate_parent() {
        let renderer = Renderer::new(false);
        let depth_two = renderer.folder_listing("/docs/sub", &[]);
        assert!(depth_two.contains("href=\"/docs\">../</a>"));

        let depth_one = renderer.folder_listing("/docs", &[]);
        assert!(depth_one.contains("href=\"/\">../</a>"));
    }

    #[test]
    fn directory_hrefs_end_with_a_slash() {
        let renderer = Renderer::new(false);
        let entries = [FileEntry {
            name: "sub".to_string(),
            is_dir: true,
            size: 0,
            modified: None,
        }];
        let page = renderer.folder_listing("/docs", &entries);
        assert!(page.contains("href=\"/docs/sub/\""));
    }

    #[test]
    fn hrefs_percent_encode_reserved_characters() {
        let renderer = Renderer::new(false);
        let entries = [
            FileEntry {
                name: "a #1?.txt".to_string(),
                is_dir: false,
                size: 1,
                modified: None,
            },
            FileEntry {
                name: "50%.txt".to_string(),
                is_dir: false,
                size: 1,
                modified: None,
            },
        ];
        let page = renderer.folder_listing("/", &entries);
        assert!(page.contains("href=\"/a%20%231%3F.txt\""));
        assert!(page.contains(">a #1?.txt</a>"));
        assert!(page.contains("href=\"/50%25.txt\""));
    }

    #[test]
    fn upload_script_only_when_enabled() {
        let renderer = Renderer::new(true);
        assert!(renderer.folder_listing("/", &[]).contains("<script>"));

        let renderer = Renderer::new(false);
        assert!(!renderer.folder_listing("/", &[]).contains("<script>"));
    }
}
