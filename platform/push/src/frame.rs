//! STOMP 1.2 frame codec.

use crate::error::{PushError, PushResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Disconnect => "DISCONNECT",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "CONNECT" => Some(Command::Connect),
            "STOMP" => Some(Command::Stomp),
            "CONNECTED" => Some(Command::Connected),
            "SEND" => Some(Command::Send),
            "SUBSCRIBE" => Some(Command::Subscribe),
            "UNSUBSCRIBE" => Some(Command::Unsubscribe),
            "ACK" => Some(Command::Ack),
            "NACK" => Some(Command::Nack),
            "BEGIN" => Some(Command::Begin),
            "COMMIT" => Some(Command::Commit),
            "ABORT" => Some(Command::Abort),
            "DISCONNECT" => Some(Command::Disconnect),
            "MESSAGE" => Some(Command::Message),
            "RECEIPT" => Some(Command::Receipt),
            "ERROR" => Some(Command::Error),
            _ => None,
        }
    }

    // CONNECT and CONNECTED headers are sent verbatim
    fn escapes_headers(self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for `name`; repeated headers keep their first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Decodes every frame in `raw`. Heart-beat EOLs between frames are
    /// skipped, so a heart-beat-only payload yields no frames.
    pub fn decode_all(raw: &str) -> PushResult<Vec<Frame>> {
        let mut frames = Vec::new();
        let mut rest = raw;
        loop {
            rest = rest.trim_start_matches(['\r', '\n']);
            if rest.is_empty() {
                break;
            }
            let (frame, remaining) = decode_one(rest)?;
            frames.push(frame);
            rest = remaining;
        }
        Ok(frames)
    }
}

fn decode_one(raw: &str) -> PushResult<(Frame, &str)> {
    let (command_line, mut rest) = split_line(raw)
        .ok_or_else(|| PushError::Frame("frame ends before command line".into()))?;
    let command = Command::from_name(command_line)
        .ok_or_else(|| PushError::Frame(format!("unknown command `{command_line}`")))?;
    let unescape = command.escapes_headers();

    let mut headers = Vec::new();
    loop {
        let (line, remaining) = split_line(rest)
            .ok_or_else(|| PushError::Frame("frame ends inside headers".into()))?;
        rest = remaining;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| PushError::Frame(format!("malformed header `{line}`")))?;
        if unescape {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .map(|(_, value)| {
            value
                .parse::<usize>()
                .map_err(|_| PushError::Frame(format!("bad content-length `{value}`")))
        })
        .transpose()?;

    let body_end = match content_length {
        Some(len) => {
            if rest.len() < len || !rest.is_char_boundary(len) {
                return Err(PushError::Frame("body shorter than content-length".into()));
            }
            len
        }
        None => rest
            .find('\0')
            .ok_or_else(|| PushError::Frame("missing NUL terminator".into()))?,
    };
    let body = rest[..body_end].to_string();
    let after = &rest[body_end..];
    let after = after
        .strip_prefix('\0')
        .ok_or_else(|| PushError::Frame("missing NUL terminator".into()))?;

    Ok((
        Frame {
            command,
            headers,
            body,
        },
        after,
    ))
}

fn split_line(raw: &str) -> Option<(&str, &str)> {
    let idx = raw.find('\n')?;
    let line = raw[..idx].strip_suffix('\r').unwrap_or(&raw[..idx]);
    Some((line, &raw[idx + 1..]))
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(value: &str) -> PushResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(PushError::Frame(format!(
                    "undefined escape `\\{}`",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_layout() {
        let frame = Frame::new(Command::Subscribe)
            .header("id", "sub-0")
            .header("destination", "/topic/newEmployee");
        assert_eq!(
            frame.encode(),
            "SUBSCRIBE\nid:sub-0\ndestination:/topic/newEmployee\n\n\0"
        );
    }

    #[test]
    fn message_headers_are_escaped_and_restored() {
        let frame = Frame::new(Command::Message)
            .header("destination", "/topic/updateEmployee")
            .header("note", "a:b\nc\\d")
            .body("{\"id\":1}");
        let encoded = frame.encode();
        assert!(encoded.contains("note:a\\cb\\nc\\\\d\n"));
        let decoded = Frame::decode_all(&encoded).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].get("note"), Some("a:b\nc\\d"));
        assert_eq!(decoded[0].body, "{\"id\":1}");
    }

    #[test]
    fn connected_headers_are_not_unescaped() {
        let frames = Frame::decode_all("CONNECTED\nversion:1.2\nserver:a\\cb\n\n\0").unwrap();
        assert_eq!(frames[0].command, Command::Connected);
        assert_eq!(frames[0].get("server"), Some("a\\cb"));
    }

    #[test]
    fn heartbeats_between_frames_are_skipped() {
        let raw = "\n\r\nMESSAGE\ndestination:/topic/a\n\none\0\nMESSAGE\r\ndestination:/topic/b\r\n\r\ntwo\0\n";
        let frames = Frame::decode_all(raw).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].get("destination"), Some("/topic/b"));
        assert_eq!(frames[1].body, "two");
        assert!(Frame::decode_all("\n\n").unwrap().is_empty());
    }

    #[test]
    fn content_length_allows_nul_in_body() {
        let raw = "MESSAGE\ncontent-length:3\n\na\0b\0";
        let frames = Frame::decode_all(raw).unwrap();
        assert_eq!(frames[0].body, "a\0b");
    }

    #[test]
    fn repeated_headers_keep_first_value() {
        let frames = Frame::decode_all("MESSAGE\nfoo:1\nfoo:2\n\n\0").unwrap();
        assert_eq!(frames[0].get("foo"), Some("1"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = Frame::decode_all("HELLO\n\n\0").unwrap_err();
        assert!(matches!(err, PushError::Frame(_)));
    }
}
