//! Lecture des tables attributaires dBASE (.dbf)

use std::collections::HashMap;
use std::io::Cursor;

use dbase::encoding::EncodingRs;
use dbase::FieldValue;
use encoding_rs::Encoding;
use tracing::{debug, trace};

use crate::GeoError;

/// Champ ajouté par `dbase` pour l'octet de suppression
const DELETION_FLAG: &str = "DeletionFlag";

/// Position du Language Driver ID dans l'en-tête
const LDID_OFFSET: usize = 29;

/// Table dBASE décodée
#[derive(Debug, Clone)]
pub struct DbfTable {
    /// Noms des champs, dans l'ordre de l'en-tête
    pub fields: Vec<String>,

    /// Un enregistrement par ligne, dans l'ordre du fichier
    pub records: Vec<HashMap<String, String>>,

    /// Nom de l'encodage retenu pour les champs texte
    pub encoding: &'static str,
}

/// Mappe le Language Driver ID de l'en-tête vers un encodage
///
/// `None` signifie « non déclaré » : le texte sera testé en UTF-8 d'abord.
pub fn ldid_to_encoding(ldid: u8) -> Option<&'static Encoding> {
    match ldid {
        0x00 => None,
        0x26 | 0x65 => Some(encoding_rs::IBM866),
        0x13 | 0x7B => Some(encoding_rs::SHIFT_JIS),
        0x4D | 0x7A => Some(encoding_rs::GBK),
        0x4E | 0x79 => Some(encoding_rs::EUC_KR),
        0x4F | 0x78 => Some(encoding_rs::BIG5),
        0x7C => Some(encoding_rs::WINDOWS_874),
        0x7D => Some(encoding_rs::WINDOWS_1255),
        0x7E => Some(encoding_rs::WINDOWS_1256),
        0x64 | 0xC8 => Some(encoding_rs::WINDOWS_1250),
        0xC9 => Some(encoding_rs::WINDOWS_1251),
        0xCA => Some(encoding_rs::WINDOWS_1254),
        0xCB => Some(encoding_rs::WINDOWS_1253),
        0xCC => Some(encoding_rs::WINDOWS_1257),
        // 437, 850, 1252 et variantes espagnoles : Windows-1252 (le plus proche)
        _ => Some(encoding_rs::WINDOWS_1252),
    }
}

/// Encodage d'une table sans LDID : UTF-8 si le corps est valide, sinon 1252
fn detect_encoding(body: &[u8]) -> &'static Encoding {
    match simdutf8::basic::from_utf8(body) {
        Ok(_) => encoding_rs::UTF_8,
        Err(_) => encoding_rs::WINDOWS_1252,
    }
}

/// Parse une table .dbf
///
/// `encoding` force l'encodage des champs texte ; sinon il est déduit du
/// Language Driver ID de l'en-tête.
pub fn parse(data: &[u8], encoding: Option<&'static Encoding>) -> Result<DbfTable, GeoError> {
    if data.len() < 32 {
        return Err(GeoError::dbf(format!("header needs 32 bytes, got {}", data.len())));
    }

    let encoding = match encoding.or_else(|| ldid_to_encoding(data[LDID_OFFSET])) {
        Some(encoding) => encoding,
        None => {
            let header_len = u16::from_le_bytes([data[8], data[9]]) as usize;
            detect_encoding(data.get(header_len..).unwrap_or_default())
        }
    };

    let mut reader =
        dbase::Reader::new_with_encoding(Cursor::new(data), EncodingRs::from(encoding))?;
    let fields: Vec<String> = reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .filter(|name| name != DELETION_FLAG)
        .collect();

    let records: Vec<HashMap<String, String>> = reader
        .read()?
        .iter()
        .map(|record| {
            fields
                .iter()
                .filter_map(|name| {
                    record
                        .get(name)
                        .map(|value| (name.clone(), value_to_text(name, value)))
                })
                .collect()
        })
        .collect();

    debug!(
        records = records.len(),
        fields = fields.len(),
        encoding = encoding.name(),
        "Parsed dBASE table"
    );

    Ok(DbfTable {
        fields,
        records,
        encoding: encoding.name(),
    })
}

/// Convertit une valeur de champ en texte ; une valeur nulle donne ""
fn value_to_text(name: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Character(Some(text)) => text.trim_matches([' ', '\0']).to_string(),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
            n.to_string()
        }
        FieldValue::Float(Some(f)) => f.to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Logical(Some(b)) => b.to_string(),
        FieldValue::Date(Some(d)) => format!("{:04}{:02}{:02}", d.year(), d.month(), d.day()),
        other => {
            trace!(field = name, value = ?other, "Empty or unsupported dBASE value");
            String::new()
        }
    }
}
