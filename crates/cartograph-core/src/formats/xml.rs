//! XML map files.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <map>
//!   <room id="0" location="Landing">
//!     <title>[Town Square]</title>
//!     <description>A bustling square.</description>
//!     <paths>Obvious paths: north.</paths>
//!     <tag>town</tag>
//!     <uid>7100</uid>
//!     <image name="landing.png" coords="1,2,3,4"/>
//!     <exit target="1" cost="0.2">north</exit>
//!     <exit target="2" cost-fn="closed">go gate</exit>
//!     <extra name="check_location">true</extra>
//!   </room>
//! </map>
//! ```
//!
//! An exit with neither `cost` nor `cost-fn` is disabled.

use super::{decode_error, encode_error};
use crate::room::Room;
use crate::{EdgeCost, NavError, RoomId, Uid};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

// =============================================================================
// DECODING
// =============================================================================

/// Element whose text content is being collected.
enum Pending {
    Title,
    Description,
    Paths,
    Tag,
    Uid,
    Exit { target: RoomId, cost: EdgeCost },
    Extra { name: String },
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, NavError> {
    for attr in element.attributes() {
        let attr = attr.map_err(decode_error)?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(decode_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required<T: std::str::FromStr>(element: &BytesStart<'_>, key: &str) -> Result<T, NavError> {
    let raw = attribute(element, key.as_bytes())?.ok_or_else(|| {
        NavError::Deserialization(format!(
            "<{}> missing attribute {}",
            String::from_utf8_lossy(element.name().as_ref()),
            key
        ))
    })?;
    raw.trim()
        .parse()
        .map_err(|_| NavError::Deserialization(format!("invalid {} attribute: {}", key, raw)))
}

fn open_room(element: &BytesStart<'_>) -> Result<Room, NavError> {
    let mut room = Room::new(RoomId(required(element, "id")?));
    room.location = attribute(element, b"location")?;
    room.climate = attribute(element, b"climate")?;
    room.terrain = attribute(element, b"terrain")?;
    Ok(room)
}

fn apply_image(room: &mut Room, element: &BytesStart<'_>) -> Result<(), NavError> {
    room.image = attribute(element, b"name")?;
    if let Some(coords) = attribute(element, b"coords")? {
        let parts: Vec<i32> = coords
            .split(',')
            .map(|p| p.trim().parse())
            .collect::<Result<_, _>>()
            .map_err(|_| NavError::Deserialization(format!("invalid image coords: {}", coords)))?;
        let coords: [i32; 4] = parts
            .try_into()
            .map_err(|_| NavError::Deserialization("image coords need 4 values".to_string()))?;
        room.image_coords = Some(coords);
    }
    Ok(())
}

fn exit_cost(element: &BytesStart<'_>) -> Result<EdgeCost, NavError> {
    if let Some(name) = attribute(element, b"cost-fn")? {
        return Ok(EdgeCost::computed(name));
    }
    match attribute(element, b"cost")? {
        Some(secs) => {
            let secs: f64 = secs
                .trim()
                .parse()
                .map_err(|_| NavError::Deserialization(format!("invalid exit cost: {}", secs)))?;
            EdgeCost::from_secs_f64(secs)
        }
        None => Ok(EdgeCost::Disabled),
    }
}

fn pending_for(element: &BytesStart<'_>) -> Result<Option<Pending>, NavError> {
    Ok(match element.name().as_ref() {
        b"title" => Some(Pending::Title),
        b"description" => Some(Pending::Description),
        b"paths" => Some(Pending::Paths),
        b"tag" => Some(Pending::Tag),
        b"uid" => Some(Pending::Uid),
        b"exit" => Some(Pending::Exit {
            target: RoomId(required(element, "target")?),
            cost: exit_cost(element)?,
        }),
        b"extra" => Some(Pending::Extra {
            name: required(element, "name")?,
        }),
        _ => None,
    })
}

fn finish(room: &mut Room, pending: Pending, text: String) -> Result<(), NavError> {
    match pending {
        Pending::Title => room.title.push(text),
        Pending::Description => room.description.push(text),
        Pending::Paths => room.paths.push(text),
        Pending::Tag => {
            room.add_tag(text);
        }
        Pending::Uid => {
            let uid = text
                .trim()
                .parse()
                .map_err(|_| NavError::Deserialization(format!("invalid uid: {}", text)))?;
            room.uid.push(Uid(uid));
        }
        Pending::Exit { target, cost } => room.add_exit(target, text, cost),
        Pending::Extra { name } => {
            let value = serde_json::from_str(&text).map_err(decode_error)?;
            room.extra.insert(name, value);
        }
    }
    Ok(())
}

pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Room>, NavError> {
    let source = std::str::from_utf8(bytes).map_err(decode_error)?;
    // Text is kept verbatim; whitespace between elements is never collected
    // because nothing is pending there.
    let mut reader = Reader::from_str(source);

    let mut rooms = Vec::new();
    let mut room: Option<Room> = None;
    let mut pending: Option<Pending> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(decode_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"room" => room = Some(open_room(&e)?),
                b"image" => {
                    if let Some(room) = room.as_mut() {
                        apply_image(room, &e)?;
                    }
                }
                _ if room.is_some() => {
                    pending = pending_for(&e)?;
                    text.clear();
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"room" => rooms.push(open_room(&e)?),
                b"image" => {
                    if let Some(room) = room.as_mut() {
                        apply_image(room, &e)?;
                    }
                }
                // <exit target=".." cost=".."/> carries an empty command
                _ => {
                    if let (Some(room), Some(p)) = (room.as_mut(), pending_for(&e)?) {
                        finish(room, p, String::new())?;
                    }
                }
            },
            Event::Text(t) => {
                if pending.is_some() {
                    text.push_str(&t.unescape().map_err(decode_error)?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"room" => rooms.extend(room.take()),
                _ => {
                    if let (Some(room), Some(p)) = (room.as_mut(), pending.take()) {
                        finish(room, p, std::mem::take(&mut text))?;
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if room.is_some() {
        return Err(NavError::Deserialization("unterminated <room>".to_string()));
    }
    Ok(rooms)
}

// =============================================================================
// ENCODING
// =============================================================================

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), NavError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(encode_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(encode_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(encode_error)?;
    Ok(())
}

fn write_room<W: std::io::Write>(writer: &mut Writer<W>, room: &Room) -> Result<(), NavError> {
    let id = room.id.to_string();
    let mut start = BytesStart::new("room");
    start.push_attribute(("id", id.as_str()));
    for (key, value) in [
        ("location", &room.location),
        ("climate", &room.climate),
        ("terrain", &room.terrain),
    ] {
        if let Some(value) = value {
            start.push_attribute((key, value.as_str()));
        }
    }
    writer.write_event(Event::Start(start)).map_err(encode_error)?;

    for (name, variants) in [
        ("title", &room.title),
        ("description", &room.description),
        ("paths", &room.paths),
        ("tag", &room.tags),
    ] {
        for variant in variants {
            text_element(writer, name, variant)?;
        }
    }
    for uid in &room.uid {
        text_element(writer, "uid", &uid.to_string())?;
    }

    if room.image.is_some() || room.image_coords.is_some() {
        let mut image = BytesStart::new("image");
        if let Some(name) = &room.image {
            image.push_attribute(("name", name.as_str()));
        }
        if let Some([a, b, c, d]) = room.image_coords {
            let coords = format!("{},{},{},{}", a, b, c, d);
            image.push_attribute(("coords", coords.as_str()));
        }
        writer.write_event(Event::Empty(image)).map_err(encode_error)?;
    }

    for (to, exit) in &room.exits {
        let target = to.to_string();
        let mut element = BytesStart::new("exit");
        element.push_attribute(("target", target.as_str()));
        match &exit.cost {
            EdgeCost::Disabled => {}
            EdgeCost::Fixed(cost) => {
                let secs = cost.as_secs_f64().to_string();
                element.push_attribute(("cost", secs.as_str()));
            }
            EdgeCost::Computed(name) => element.push_attribute(("cost-fn", name.as_str())),
        }
        writer.write_event(Event::Start(element)).map_err(encode_error)?;
        writer
            .write_event(Event::Text(BytesText::new(&exit.command)))
            .map_err(encode_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("exit")))
            .map_err(encode_error)?;
    }

    for (name, value) in &room.extra {
        let json = serde_json::to_string(value).map_err(encode_error)?;
        let mut element = BytesStart::new("extra");
        element.push_attribute(("name", name.as_str()));
        writer.write_event(Event::Start(element)).map_err(encode_error)?;
        writer
            .write_event(Event::Text(BytesText::new(&json)))
            .map_err(encode_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("extra")))
            .map_err(encode_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("room")))
        .map_err(encode_error)?;
    Ok(())
}

pub(super) fn encode(rooms: &[Room]) -> Result<Vec<u8>, NavError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(encode_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("map")))
        .map_err(encode_error)?;
    for room in rooms {
        write_room(&mut writer, room)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("map")))
        .map_err(encode_error)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cost;
    use serde_json::json;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map>
  <room id="0" location="Landing" terrain="urban">
    <title>[Town Square]</title>
    <description>A bustling square &amp; fountain.</description>
    <paths>Obvious paths: north, east.</paths>
    <tag>town</tag>
    <uid>7100</uid>
    <image name="landing.png" coords="10,20,30,40"/>
    <exit target="1" cost="0.2">north</exit>
    <exit target="2" cost-fn="closed">go gate</exit>
    <exit target="3">climb wall</exit>
    <extra name="check_location">true</extra>
  </room>
  <room id="1"/>
</map>
"#;

    #[test]
    fn decodes_rooms() {
        let rooms = decode(SAMPLE.as_bytes()).expect("decode");
        assert_eq!(rooms.len(), 2);

        let square = &rooms[0];
        assert_eq!(square.description, vec!["A bustling square & fountain."]);
        assert_eq!(square.terrain.as_deref(), Some("urban"));
        assert_eq!(square.image.as_deref(), Some("landing.png"));
        assert_eq!(square.image_coords, Some([10, 20, 30, 40]));
        assert_eq!(square.uid, vec![Uid(7100)]);
        assert_eq!(
            square.exit(RoomId(1)).map(|e| (e.command.as_str(), e.cost.clone())),
            Some(("north", EdgeCost::Fixed(Cost(200))))
        );
        assert_eq!(
            square.exit(RoomId(2)).map(|e| e.cost.clone()),
            Some(EdgeCost::computed("closed"))
        );
        assert_eq!(
            square.exit(RoomId(3)).map(|e| e.cost.clone()),
            Some(EdgeCost::Disabled)
        );
        assert_eq!(square.extra.get("check_location"), Some(&json!(true)));
        assert_eq!(rooms[1].id, RoomId(1));
    }

    #[test]
    fn round_trip_preserves_rooms() {
        let mut room = Room::new(RoomId(5));
        room.title = vec!["[Inn]".to_string(), "[Old Inn]".to_string()];
        room.location = Some("Solhaven <east>".to_string());
        room.add_fixed_exit(RoomId(6), "go door", Cost(1500));
        room.add_exit(RoomId(7), "ferry", EdgeCost::computed("ferry"));
        room.add_exit(RoomId(8), "swim", EdgeCost::Disabled);
        room.add_tag("inn");
        room.uid.push(Uid(99));
        room.extra
            .insert("unique_loot".to_string(), json!(["a key", "a \"map\""]));

        let bytes = encode(std::slice::from_ref(&room)).expect("encode");
        let restored = decode(&bytes).expect("decode");
        assert_eq!(restored, vec![room]);
    }

    #[test]
    fn text_kept_verbatim() {
        let mut room = Room::new(RoomId(2));
        room.title.push(" [Padded Hall] ".to_string());
        room.description
            .push("Dust hangs in the air.  \n  A draft blows.".to_string());
        room.paths.push(String::new());
        room.add_fixed_exit(RoomId(3), "  go arch", Cost(200));

        let bytes = encode(std::slice::from_ref(&room)).expect("encode");
        let restored = decode(&bytes).expect("decode");
        assert_eq!(restored, vec![room]);
    }

    #[test]
    fn whitespace_between_elements_ignored() {
        let rooms = decode(b"<map>\n  <room id=\"4\">\n    <tag>inn</tag>\n  </room>\n</map>")
            .expect("decode");
        assert_eq!(rooms[0].tags, vec!["inn"]);
        assert!(rooms[0].title.is_empty());
    }

    #[test]
    fn written_with_declaration_and_indent() {
        let bytes = encode(&[Room::new(RoomId(0))]).expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("\n  <room id=\"0\">"));
    }

    #[test]
    fn missing_room_id_rejected() {
        assert!(decode(b"<map><room><title>x</title></room></map>").is_err());
    }

    #[test]
    fn unterminated_room_rejected() {
        assert!(decode(b"<map><room id=\"1\"><title>x</title>").is_err());
    }
}
