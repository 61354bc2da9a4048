use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive is empty")]
    Empty,

    #[error("Archive entry is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Malformed XML at byte {position}: {msg}")]
    Xml { position: usize, msg: String },
}

/// A zipped XML feed; only the first entry of the archive is read
pub struct XmlArchive;

impl XmlArchive {
    pub fn read_file(path: &Path) -> Result<String, ArchiveError> {
        let file = std::fs::File::open(path)?;
        Self::read_first_entry(file)
    }

    pub fn read_bytes(bytes: Vec<u8>) -> Result<String, ArchiveError> {
        Self::read_first_entry(Cursor::new(bytes))
    }

    fn read_first_entry<R: Read + Seek>(reader: R) -> Result<String, ArchiveError> {
        let mut archive = zip::ZipArchive::new(reader)?;
        if archive.is_empty() {
            return Err(ArchiveError::Empty);
        }

        let mut entry = archive.by_index(0)?;
        debug!("Reading archive entry {} ({} bytes)", entry.name(), entry.size());

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Callbacks for a streaming walk over an XML document
///
/// `path` holds the local names (namespace prefix stripped) of the open
/// elements, outermost first; for `text` the last entry is the element that
/// owns the text.
pub trait XmlVisitor {
    fn start(&mut self, path: &[String]);
    fn text(&mut self, path: &[String], text: &str);
    fn end(&mut self, path: &[String]);
}

/// Walk an XML document, reporting element starts, text and ends
pub fn walk_xml<V: XmlVisitor>(xml: &str, visitor: &mut V) -> Result<(), ArchiveError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| ArchiveError::Xml {
            position: reader.buffer_position(),
            msg: e.to_string(),
        })?;

        match event {
            Event::Start(tag) => {
                path.push(String::from_utf8_lossy(tag.local_name().as_ref()).into_owned());
                visitor.start(&path);
            }
            Event::Empty(tag) => {
                path.push(String::from_utf8_lossy(tag.local_name().as_ref()).into_owned());
                visitor.start(&path);
                visitor.end(&path);
                path.pop();
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| ArchiveError::Xml {
                    position: reader.buffer_position(),
                    msg: e.to_string(),
                })?;
                visitor.text(&path, &text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                visitor.text(&path, &text);
            }
            Event::End(_) => {
                visitor.end(&path);
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(ArchiveError::Xml {
            position: reader.buffer_position(),
            msg: format!("unclosed element <{}>", path.join("/")),
        });
    }
    Ok(())
}

/// True when `path` ends with `suffix`
pub fn path_ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}
