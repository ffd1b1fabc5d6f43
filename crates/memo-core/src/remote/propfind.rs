//! `PROPFIND` multistatus parsing.
//!
//! Servers disagree on namespace prefixes (`D:`, `d:`, `lp1:`, none), so
//! elements are matched on their local name only.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::RemoteEntry;

/// Request body asking for the properties a listing needs.
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
    <d:getlastmodified/>
    <d:getcontentlength/>
  </d:prop>
</d:propfind>"#;

#[derive(Debug, Default)]
struct PendingEntry {
    href: Option<String>,
    last_modified: Option<String>,
    content_length: Option<String>,
    is_collection: bool,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Href,
    LastModified,
    ContentLength,
}

/// Parse a Depth:1 multistatus body into directory entries.
///
/// `request_path` is the decoded URL path that was listed; the entry describing
/// it is dropped. Entries without a usable href or with a malformed size are
/// skipped. A body that is not a multistatus document is an error.
pub fn parse_multistatus(body: &str, request_path: &str) -> Result<Vec<RemoteEntry>, String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut pending = Vec::new();
    let mut current: Option<PendingEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_resourcetype = false;
    let mut saw_multistatus = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|error| format!("malformed XML: {error}"))?;

        match event {
            Event::Start(element) => match element.local_name().as_ref() {
                b"multistatus" => saw_multistatus = true,
                b"response" => current = Some(PendingEntry::default()),
                b"href" => field = Some(Field::Href),
                b"getlastmodified" => field = Some(Field::LastModified),
                b"getcontentlength" => field = Some(Field::ContentLength),
                b"resourcetype" => in_resourcetype = true,
                b"collection" if in_resourcetype => mark_collection(current.as_mut()),
                _ => {}
            },
            Event::Empty(element) => {
                if in_resourcetype && element.local_name().as_ref() == b"collection" {
                    mark_collection(current.as_mut());
                }
            }
            Event::Text(text) => {
                if let (Some(field), Some(entry)) = (field, current.as_mut()) {
                    let value = text
                        .unescape()
                        .map_err(|error| format!("invalid text content: {error}"))?
                        .into_owned();
                    match field {
                        // The first href in a response names the resource itself.
                        Field::Href => {
                            entry.href.get_or_insert(value);
                        }
                        Field::LastModified => entry.last_modified = Some(value),
                        Field::ContentLength => entry.content_length = Some(value),
                    }
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"response" => {
                    if let Some(entry) = current.take() {
                        pending.push(entry);
                    }
                }
                b"href" | b"getlastmodified" | b"getcontentlength" => field = None,
                b"resourcetype" => in_resourcetype = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_multistatus {
        return Err("response is not a DAV multistatus document".to_string());
    }

    let request_path = normalize_path(request_path);
    Ok(pending
        .into_iter()
        .filter_map(|entry| into_entry(entry, &request_path))
        .collect())
}

fn mark_collection(entry: Option<&mut PendingEntry>) {
    if let Some(entry) = entry {
        entry.is_collection = true;
    }
}

fn into_entry(entry: PendingEntry, request_path: &str) -> Option<RemoteEntry> {
    let Some(href) = entry.href.filter(|href| !href.trim().is_empty()) else {
        debug!("Skipping PROPFIND entry without href");
        return None;
    };

    let Some(path) = href_path(&href) else {
        debug!(%href, "Skipping PROPFIND entry with undecodable href");
        return None;
    };
    let path = normalize_path(&path);
    if path == request_path {
        return None;
    }

    let name = path.rsplit('/').next().unwrap_or_default().to_string();
    if name.is_empty() {
        return None;
    }

    let size = match entry.content_length.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(raw) => {
            if let Ok(size) = raw.parse::<u64>() {
                size
            } else {
                debug!(%href, raw, "Skipping PROPFIND entry with invalid content length");
                return None;
            }
        }
    };

    let last_modified = entry
        .last_modified
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc2822(raw.trim()).ok())
        .map(|value| value.with_timezone(&Utc));

    Some(RemoteEntry {
        name,
        path,
        is_collection: entry.is_collection,
        last_modified,
        size,
    })
}

/// Extract the decoded path from an absolute or server-relative href.
fn href_path(href: &str) -> Option<String> {
    let href = href.trim();
    let raw_path = if href.starts_with("http://") || href.starts_with("https://") {
        reqwest::Url::parse(href).ok()?.path().to_string()
    } else {
        href.split(['?', '#']).next().unwrap_or_default().to_string()
    };
    urlencoding::decode(&raw_path).ok().map(|path| path.into_owned())
}

fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/memo_data/notes/</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype><D:collection/></D:resourcetype>
        <D:getlastmodified>Mon, 01 Jan 2024 10:00:00 GMT</D:getlastmodified>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/dav/memo_data/notes/2024-W01.json</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype/>
        <D:getlastmodified>Tue, 02 Jan 2024 08:30:00 GMT</D:getlastmodified>
        <D:getcontentlength>512</D:getcontentlength>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/dav/memo_data/notes/archive%20old/</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype><D:collection/></D:resourcetype>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    #[test]
    fn parses_entries_and_drops_self() {
        let entries = parse_multistatus(LISTING, "/dav/memo_data/notes").unwrap();
        assert_eq!(entries.len(), 2);

        let shard = &entries[0];
        assert_eq!(shard.name, "2024-W01.json");
        assert_eq!(shard.path, "/dav/memo_data/notes/2024-W01.json");
        assert!(!shard.is_collection);
        assert_eq!(shard.size, 512);
        assert_eq!(
            shard.last_modified.map(|value| value.to_rfc3339()),
            Some("2024-01-02T08:30:00+00:00".to_string())
        );

        let folder = &entries[1];
        assert_eq!(folder.name, "archive old");
        assert!(folder.is_collection);
        assert_eq!(folder.size, 0);
    }

    #[test]
    fn handles_lowercase_and_unprefixed_namespaces() {
        let body = r#"<d:multistatus xmlns:d="DAV:">
            <d:response>
              <d:href>https://dav.example.com/root/notes/2023-W52.json</d:href>
              <d:propstat><d:prop><d:getcontentlength>7</d:getcontentlength></d:prop></d:propstat>
            </d:response>
            <response xmlns="DAV:">
              <href>/root/notes/2024-W02.json</href>
              <propstat><prop><resourcetype/></prop></propstat>
            </response>
          </d:multistatus>"#;

        let entries = parse_multistatus(body, "/root/notes/").unwrap();
        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["2023-W52.json", "2024-W02.json"]);
        assert_eq!(entries[0].size, 7);
    }

    #[test]
    fn skips_unusable_entries() {
        let body = r#"<D:multistatus xmlns:D="DAV:">
            <D:response><D:propstat><D:prop/></D:propstat></D:response>
            <D:response>
              <D:href>/notes/bad.json</D:href>
              <D:propstat><D:prop><D:getcontentlength>lots</D:getcontentlength></D:prop></D:propstat>
            </D:response>
            <D:response><D:href>/notes/good.json</D:href></D:response>
          </D:multistatus>"#;

        let entries = parse_multistatus(body, "/notes").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "good.json");
    }

    #[test]
    fn rejects_documents_that_are_not_multistatus() {
        assert!(parse_multistatus("<html><body>login</body></html>", "/notes").is_err());
        assert!(parse_multistatus("not xml at all", "/notes").is_err());
        assert!(parse_multistatus("<D:multistatus xmlns:D=\"DAV:\"><D:response></D:href>", "/")
            .is_err());
    }

    #[test]
    fn unparsable_dates_are_left_empty() {
        let body = r#"<D:multistatus xmlns:D="DAV:">
            <D:response>
              <D:href>/notes/a.json</D:href>
              <D:propstat><D:prop><D:getlastmodified>yesterday</D:getlastmodified></D:prop></D:propstat>
            </D:response>
          </D:multistatus>"#;

        let entries = parse_multistatus(body, "/notes").unwrap();
        assert_eq!(entries[0].last_modified, None);
    }
}
