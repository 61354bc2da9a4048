use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::importers::xml_archive::{path_ends_with, walk_xml, XmlVisitor};
use crate::importers::ArchiveError;

static CHAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(\d+);").expect("character reference pattern is valid"));

/// Remove decimal numeric character references (`&#13;`, `&#8364;`, ...).
///
/// The RNA dumps carry references to code points that are not valid XML
/// characters; they are dropped rather than decoded.
pub fn strip_char_refs(xml: &str) -> Cow<'_, str> {
    CHAR_REF.replace_all(xml, "")
}

/// One flattened aid: an `AIUTO` element with one of its instruments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AidRecord {
    /// `COD_CE_MISURA`, as published
    pub cod_ce: Option<String>,
    pub denom_benef: Option<String>,
    pub cf_benef: Option<String>,
    /// `IMPORTO_NOMINALE` of the instrument, unparsed
    pub importo: Option<String>,
}

#[derive(Default)]
struct AidBuilder {
    cod_ce: Option<String>,
    denom_benef: Option<String>,
    cf_benef: Option<String>,
    amounts: Vec<Option<String>>,
}

fn append(field: &mut Option<String>, text: &str) {
    field.get_or_insert_with(String::new).push_str(text);
}

#[derive(Default)]
struct AidsVisitor {
    current: Option<AidBuilder>,
    records: Vec<AidRecord>,
}

impl XmlVisitor for AidsVisitor {
    fn start(&mut self, path: &[String]) {
        match path.last().map(String::as_str) {
            Some("AIUTO") => self.current = Some(AidBuilder::default()),
            Some("STRUMENTO_AIUTO") => {
                if let Some(aid) = self.current.as_mut() {
                    aid.amounts.push(None);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, path: &[String], text: &str) {
        let Some(aid) = self.current.as_mut() else {
            return;
        };
        if path_ends_with(path, &["AIUTO", "COD_CE_MISURA"]) {
            append(&mut aid.cod_ce, text);
        } else if path_ends_with(path, &["AIUTO", "DENOMINAZIONE_BENEFICIARIO"]) {
            append(&mut aid.denom_benef, text);
        } else if path_ends_with(path, &["AIUTO", "CODICE_FISCALE_BENEFICIARIO"]) {
            append(&mut aid.cf_benef, text);
        } else if path_ends_with(
            path,
            &["STRUMENTI_AIUTO", "STRUMENTO_AIUTO", "IMPORTO_NOMINALE"],
        ) {
            if let Some(amount) = aid.amounts.last_mut() {
                append(amount, text);
            }
        }
    }

    fn end(&mut self, path: &[String]) {
        if path.last().map(String::as_str) != Some("AIUTO") {
            return;
        }
        let Some(aid) = self.current.take() else {
            return;
        };

        let record = AidRecord {
            cod_ce: aid.cod_ce,
            denom_benef: aid.denom_benef,
            cf_benef: aid.cf_benef,
            importo: None,
        };
        if aid.amounts.is_empty() {
            self.records.push(record);
        } else {
            for importo in aid.amounts {
                self.records.push(AidRecord {
                    importo,
                    ..record.clone()
                });
            }
        }
    }
}

/// Flatten an `OpenData_Aiuti` document: one record per aid instrument, or a
/// single record without amount for an aid that lists none
pub fn parse_aids(xml: &str) -> Result<Vec<AidRecord>, ArchiveError> {
    let cleaned = strip_char_refs(xml);
    let mut visitor = AidsVisitor::default();
    walk_xml(&cleaned, &mut visitor)?;
    Ok(visitor.records)
}
