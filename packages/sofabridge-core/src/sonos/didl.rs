//! DIDL-Lite metadata formatting and parsing.
//!
//! Sonos expects DIDL-Lite alongside every transport or queue URI that comes
//! from a music service, and returns DIDL-Lite from ContentDirectory browses.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::sonos::types::LibraryItem;
use crate::sonos::utils::escape_xml;

const DIDL_OPEN: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#;
const DIDL_CLOSE: &str = "</DIDL-Lite>";

/// Fields of a single-item DIDL-Lite document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidlItem<'a> {
    pub item_id: &'a str,
    pub parent_id: &'a str,
    pub title: &'a str,
    pub class: &'a str,
    /// Service descriptor placed in `<desc>` (e.g. `SA_RINCON2311_X_#Svc2311-0-Token`).
    pub descriptor: &'a str,
}

/// Formats a one-item DIDL-Lite document.
pub fn format_didl_item(item: &DidlItem<'_>) -> String {
    let mut didl = String::from(DIDL_OPEN);
    didl.push_str(&format!(
        r#"<item id="{}" parentID="{}" restricted="true">"#,
        escape_xml(item.item_id),
        escape_xml(item.parent_id)
    ));
    didl.push_str(&format!("<dc:title>{}</dc:title>", escape_xml(item.title)));
    didl.push_str(&format!("<upnp:class>{}</upnp:class>", item.class));
    didl.push_str(&format!(
        r#"<desc id="cdudn" nameSpace="urn:schemas-rinconnetworks-com:metadata-1-0/">{}</desc>"#,
        escape_xml(item.descriptor)
    ));
    didl.push_str("</item>");
    didl.push_str(DIDL_CLOSE);
    didl
}

/// Parses the `<item>`/`<container>` entries of a browse result.
///
/// Entries without a title are skipped. The URI is taken from `<res>`; the
/// favorite's own metadata from `<r:resMD>`.
pub fn parse_didl_items(xml: &str) -> Vec<LibraryItem> {
    let mut items = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut current: Option<LibraryItem> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"item" | b"container" => {
                        current = Some(LibraryItem::default());
                    }
                    b"title" | b"creator" | b"album" | b"albumArtURI" | b"res" | b"resMD" => {
                        let field = local.as_ref().to_vec();
                        let text = match reader.read_text(e.name()) {
                            Ok(t) => html_escape::decode_html_entities(&t).into_owned(),
                            Err(err) => {
                                log::warn!("[DIDL] Unreadable element in browse result: {}", err);
                                break;
                            }
                        };
                        if let Some(item) = current.as_mut() {
                            assign_field(item, &field, text);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e))
                if matches!(e.local_name().as_ref(), b"item" | b"container") =>
            {
                if let Some(item) = current.take() {
                    if !item.title.is_empty() {
                        items.push(item);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("[DIDL] XML parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    items
}

fn assign_field(item: &mut LibraryItem, field: &[u8], text: String) {
    let value = text.trim().to_string();
    match field {
        b"title" => item.title = value,
        b"res" => item.uri = value,
        b"resMD" if !value.is_empty() => item.metadata = Some(value),
        b"creator" if !value.is_empty() => item.artist = Some(value),
        b"album" if !value.is_empty() => item.album = Some(value),
        b"albumArtURI" if !value.is_empty() => item.album_art_uri = Some(value),
        _ => {}
    }
}
