//! Engine.IO v4 / Socket.IO v5 text packets, as far as the occupancy feed
//! needs them.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Event carrying the free slots and camera frames.
pub const UPDATE_SLOTS: &str = "update_slots";

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownType(char),
    #[error("invalid packet payload: {0}")]
    InvalidPayload(String),
    #[error("event packet without a name")]
    MissingEventName,
}

/// Handshake sent by the server right after the websocket opens.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Noop,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, args: Vec<Value> },
    ConnectError(Option<Value>),
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();
        match kind {
            '0' => serde_json::from_str(rest)
                .map(EnginePacket::Open)
                .map_err(|err| ProtocolError::InvalidPayload(err.to_string())),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(rest.to_string())),
            '3' => Ok(EnginePacket::Pong(rest.to_string())),
            '4' => SocketPacket::decode(rest).map(EnginePacket::Message),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

impl SocketPacket {
    fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let body = strip_ack_id(strip_namespace(chars.as_str()));

        match kind {
            '0' => Ok(SocketPacket::Connect(optional_json(body)?)),
            '1' => Ok(SocketPacket::Disconnect),
            '2' => {
                let mut args: Vec<Value> = serde_json::from_str(body)
                    .map_err(|err| ProtocolError::InvalidPayload(err.to_string()))?;
                if args.is_empty() {
                    return Err(ProtocolError::MissingEventName);
                }
                match args.remove(0) {
                    Value::String(name) => Ok(SocketPacket::Event { name, args }),
                    _ => Err(ProtocolError::MissingEventName),
                }
            }
            '4' => Ok(SocketPacket::ConnectError(optional_json(body)?)),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }

    fn encode(&self) -> String {
        match self {
            SocketPacket::Connect(None) => "0".to_string(),
            SocketPacket::Connect(Some(auth)) => format!("0{auth}"),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!("2{}", Value::Array(items))
            }
            SocketPacket::ConnectError(None) => "4".to_string(),
            SocketPacket::ConnectError(Some(data)) => format!("4{data}"),
        }
    }
}

/// `/admin,` style namespace prefix; the default namespace has none.
fn strip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        match text.find(',') {
            Some(comma) => &text[comma + 1..],
            None => "",
        }
    } else {
        text
    }
}

fn strip_ack_id(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn optional_json(body: &str) -> Result<Option<Value>, ProtocolError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|err| ProtocolError::InvalidPayload(err.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_open_handshake() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();
        assert_eq!(
            packet,
            EnginePacket::Open(OpenHandshake {
                sid: "lv_VI97HAXpY6yYWAAAC".into(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let packet = EnginePacket::decode("2").unwrap();
        assert_eq!(packet, EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
    }

    #[test]
    fn decodes_connect_and_disconnect() {
        assert_eq!(
            EnginePacket::decode(r#"40{"sid":"abc"}"#).unwrap(),
            EnginePacket::Message(SocketPacket::Connect(Some(json!({"sid": "abc"}))))
        );
        assert_eq!(
            EnginePacket::decode("41").unwrap(),
            EnginePacket::Message(SocketPacket::Disconnect)
        );
        assert_eq!(
            EnginePacket::Message(SocketPacket::Connect(None)).encode(),
            "40"
        );
    }

    #[test]
    fn decodes_update_slots_event() {
        let packet =
            EnginePacket::decode(r#"42["update_slots",{"free_slots":[1,4],"frame":"aGk="}]"#)
                .unwrap();
        let EnginePacket::Message(SocketPacket::Event { name, args }) = packet else {
            panic!("expected an event");
        };
        assert_eq!(name, UPDATE_SLOTS);
        assert_eq!(args, vec![json!({"free_slots": [1, 4], "frame": "aGk="})]);
    }

    #[test]
    fn namespace_and_ack_id_are_skipped() {
        let packet = EnginePacket::decode(r#"42/cams,17["noop_event"]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "noop_event".into(),
                args: vec![],
            })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::Empty));
        assert_eq!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownType('9'))
        );
        assert_eq!(
            EnginePacket::decode("42[5]"),
            Err(ProtocolError::MissingEventName)
        );
        assert!(matches!(
            EnginePacket::decode("42{oops"),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }
}
