use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use super::{FieldMap, FileFormat, FlatRecord};
use crate::backend::storage::error::DataAccessError;

/// XML collection files
///
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <trips>
///   <trip>
///     <id>...</id>
///     <departureTime>2024-06-01 08:30:00</departureTime>
///     ...
///   </trip>
/// </trips>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

/// Where the reader currently is inside the document
enum Position {
    /// Before the collection root element
    Prolog,
    /// Inside the root, between records
    Collection,
    /// Inside a record element, between fields
    Record(FieldMap),
    /// Inside a field element, collecting its text
    Field { fields: FieldMap, name: String, text: String },
    /// After the closing root element
    Done,
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

impl FileFormat for XmlFormat {
    const EXTENSION: &'static str = "xml";

    fn decode<R: FlatRecord>(content: &str) -> Result<Vec<R>, DataAccessError> {
        // Field text is kept byte for byte, so no trimming on the reader
        let mut reader = Reader::from_str(content);

        let mut records = Vec::new();
        let mut position = Position::Prolog;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| DataAccessError::serialization(R::ENTITY, e))?;

            position = match (position, event) {
                (Position::Prolog, Event::Start(e)) if e.name().as_ref() == R::COLLECTION.as_bytes() => {
                    Position::Collection
                }
                (Position::Prolog, Event::Empty(e)) if e.name().as_ref() == R::COLLECTION.as_bytes() => {
                    Position::Done
                }
                (Position::Collection, Event::Start(e)) if e.name().as_ref() == R::ELEMENT.as_bytes() => {
                    Position::Record(FieldMap::new(R::ENTITY))
                }
                (Position::Collection, Event::End(_)) => Position::Done,
                (Position::Record(fields), Event::Start(e)) => Position::Field {
                    fields,
                    name: element_name(e.name().as_ref()),
                    text: String::new(),
                },
                (Position::Record(mut fields), Event::Empty(e)) => {
                    fields.insert(element_name(e.name().as_ref()), "");
                    Position::Record(fields)
                }
                (Position::Record(fields), Event::End(_)) => {
                    records.push(R::from_fields(&fields)?);
                    Position::Collection
                }
                (Position::Field { fields, name, mut text }, Event::Text(t)) => {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| DataAccessError::serialization(R::ENTITY, e))?;
                    text.push_str(&unescaped);
                    Position::Field { fields, name, text }
                }
                (Position::Field { fields, name, mut text }, Event::CData(t)) => {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    Position::Field { fields, name, text }
                }
                (Position::Field { mut fields, name, text }, Event::End(_)) => {
                    fields.insert(name, text);
                    Position::Record(fields)
                }
                (Position::Done, Event::Eof) => break,
                (_, Event::Eof) => {
                    return Err(DataAccessError::serialization(
                        R::ENTITY,
                        format!("unexpected end of <{}> document", R::COLLECTION),
                    ));
                }
                // Indentation between elements
                (position, Event::Text(t))
                    if !matches!(position, Position::Field { .. }) && t.iter().all(u8::is_ascii_whitespace) =>
                {
                    position
                }
                (position, Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => position,
                (Position::Done, _) => Position::Done,
                (_, other) => {
                    return Err(DataAccessError::serialization(
                        R::ENTITY,
                        format!("unexpected XML content {:?} in <{}> document", other, R::COLLECTION),
                    ));
                }
            };
        }

        Ok(records)
    }

    fn encode<R: FlatRecord>(records: &[R]) -> Result<String, DataAccessError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        let to_error = |e: quick_xml::Error| DataAccessError::serialization(R::ENTITY, e);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(to_error)?;
        writer
            .write_event(Event::Start(BytesStart::new(R::COLLECTION)))
            .map_err(to_error)?;

        for record in records {
            writer
                .write_event(Event::Start(BytesStart::new(R::ELEMENT)))
                .map_err(to_error)?;
            for (name, value) in R::FIELDS.iter().zip(record.to_fields()) {
                writer
                    .write_event(Event::Start(BytesStart::new(*name)))
                    .map_err(to_error)?;
                writer
                    .write_event(Event::Text(BytesText::new(&value)))
                    .map_err(to_error)?;
                writer
                    .write_event(Event::End(BytesEnd::new(*name)))
                    .map_err(to_error)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(R::ELEMENT)))
                .map_err(to_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(R::COLLECTION)))
            .map_err(to_error)?;

        String::from_utf8(writer.into_inner()).map_err(|e| DataAccessError::serialization(R::ENTITY, e))
    }
}
