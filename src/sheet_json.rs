//! Purpose: JSON envelopes for sheet headers, loaded sheets, and rows.
//! Exports: `header_json`, `sheet_json`, `row_json`, `language_label`.
//! Role: Keep CLI output shapes consistent across commands.
//! Invariants: Stable key names; the column hash is rendered as `0x`-prefixed hex.
//! Invariants: Column values that fail to decode render as `null` plus an `error` string.

use exdview::api::{ColumnDefinition, ColumnKind, Language, RawRow, Sheet, SheetHeader};
use serde_json::{Map, Value, json};

pub(crate) fn language_label(language: Language) -> &'static str {
    match language {
        Language::None => "none",
        other => other.code(),
    }
}

pub(crate) fn kind_label(kind: ColumnKind) -> String {
    match kind {
        ColumnKind::String => "string".to_string(),
        ColumnKind::Bool => "bool".to_string(),
        ColumnKind::Int8 => "int8".to_string(),
        ColumnKind::UInt8 => "uint8".to_string(),
        ColumnKind::Int16 => "int16".to_string(),
        ColumnKind::UInt16 => "uint16".to_string(),
        ColumnKind::Int32 => "int32".to_string(),
        ColumnKind::UInt32 => "uint32".to_string(),
        ColumnKind::Float32 => "float32".to_string(),
        ColumnKind::Int64 => "int64".to_string(),
        ColumnKind::UInt64 => "uint64".to_string(),
        ColumnKind::PackedBool(bit) => format!("packed_bool{bit}"),
        ColumnKind::Unknown(raw) => format!("unknown({raw:#x})"),
    }
}

pub(crate) fn header_json(name: &str, header: &SheetHeader) -> Value {
    json!({
        "name": name,
        "version": header.version,
        "variant": header.variant,
        "data_width": header.data_offset,
        "row_count": header.row_count,
        "column_hash": format!("{:#010x}", header.column_hash),
        "columns": header
            .columns
            .iter()
            .map(|column| json!({ "kind": kind_label(column.kind), "offset": column.offset }))
            .collect::<Vec<_>>(),
        "pages": header.pages,
        "languages": header
            .languages
            .iter()
            .map(|language| language_label(*language))
            .collect::<Vec<_>>(),
    })
}

/// Post-merge view statistics for a loaded sheet.
pub(crate) fn sheet_json(sheet: &Sheet<RawRow>) -> Value {
    let keys = sheet.keys();
    let mut map = Map::new();
    map.insert("language".to_string(), json!(language_label(sheet.language())));
    map.insert("has_subrows".to_string(), json!(sheet.has_subrows()));
    map.insert("pages_loaded".to_string(), json!(sheet.page_count()));
    map.insert("rows".to_string(), json!(sheet.count()));
    if let (Some(first), Some(last)) = (keys.first(), keys.last()) {
        map.insert("first_row".to_string(), json!(first));
        map.insert("last_row".to_string(), json!(last));
    }
    Value::Object(map)
}

pub(crate) fn row_json(row: &RawRow, columns: &[ColumnDefinition], subrow: bool) -> Value {
    let mut map = Map::new();
    map.insert("row_id".to_string(), json!(row.row_id()));
    if subrow {
        map.insert("subrow_id".to_string(), json!(row.subrow_id()));
    }
    map.insert("offset".to_string(), json!(row.offset()));
    map.insert(
        "columns".to_string(),
        Value::Array(columns.iter().map(|column| column_json(row, column)).collect()),
    );
    Value::Object(map)
}

fn column_json(row: &RawRow, column: &ColumnDefinition) -> Value {
    let mut map = Map::new();
    map.insert("kind".to_string(), json!(kind_label(column.kind)));
    map.insert("offset".to_string(), json!(column.offset));
    match column_value(row, column) {
        Ok(value) => {
            map.insert("value".to_string(), value);
        }
        Err(err) => {
            map.insert("value".to_string(), Value::Null);
            map.insert("error".to_string(), json!(err.to_string()));
        }
    }
    Value::Object(map)
}

fn column_value(row: &RawRow, column: &ColumnDefinition) -> Result<Value, exdview::api::Error> {
    let page = row.page();
    let at = row
        .offset()
        .checked_add(column.offset as u32)
        .unwrap_or(u32::MAX);
    let value = match column.kind {
        ColumnKind::String => {
            let bytes = row.read_string_bytes(column.offset)?;
            json!(String::from_utf8_lossy(bytes))
        }
        ColumnKind::Bool => json!(page.read_bool(at)?),
        ColumnKind::Int8 => json!(page.read_i8(at)?),
        ColumnKind::UInt8 => json!(page.read_u8(at)?),
        ColumnKind::Int16 => json!(page.read_i16(at)?),
        ColumnKind::UInt16 => json!(page.read_u16(at)?),
        ColumnKind::Int32 => json!(page.read_i32(at)?),
        ColumnKind::UInt32 => json!(page.read_u32(at)?),
        ColumnKind::Float32 => json!(page.read_f32(at)?),
        ColumnKind::Int64 => json!(page.read_i64(at)?),
        ColumnKind::UInt64 => json!(page.read_u64(at)?),
        ColumnKind::PackedBool(bit) => json!(page.read_packed_bool(at, bit)?),
        ColumnKind::Unknown(_) => Value::Null,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{kind_label, language_label};
    use exdview::api::{ColumnKind, Language};

    #[test]
    fn labels_are_stable() {
        assert_eq!(language_label(Language::None), "none");
        assert_eq!(language_label(Language::ChineseSimplified), "chs");
        assert_eq!(kind_label(ColumnKind::PackedBool(3)), "packed_bool3");
        assert_eq!(kind_label(ColumnKind::Unknown(0x8)), "unknown(0x8)");
        assert_eq!(kind_label(ColumnKind::UInt32), "uint32");
    }
}
