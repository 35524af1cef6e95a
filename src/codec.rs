//! Line framing for the TCP transport
//!
//! Splits the inbound byte stream into protocol lines and terminates
//! outbound lines with CRLF. A line ends at `\n`; a single `\r`
//! immediately before it is stripped. Bytes after the last newline stay
//! buffered until more data arrives, so pipelined commands in one read
//! are all extracted.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Codec error: invalid text or an I/O failure on the transport.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Frames protocol lines on `\n` boundaries.
///
/// There is no inbound length cap; a partial line simply waits in the
/// accumulation buffer for the rest of it.
#[derive(Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(pos) = src.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let mut line_bytes = src.split_to(pos);
        src.advance(1); // skip \n
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.truncate(line_bytes.len() - 1);
        }

        let line = std::str::from_utf8(&line_bytes)
            .map_err(|_| CodecError::InvalidUtf8)?
            .to_owned();
        Ok(Some(line))
    }
}

impl Encoder<String> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 2);
        dst.put_slice(item.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(Some(line)) = codec.decode(buf) {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn decode_strips_crlf() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"NICK alice\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("NICK alice".into()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_accepts_bare_newline() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"PING token\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING token".into()));
    }

    #[test]
    fn decode_keeps_partial_line_buffered() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"NICK al"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"ice\r\nUSER");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("NICK alice".into()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"USER");
    }

    #[test]
    fn decode_pipelined_commands() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"PASS secret\r\nNICK alice\r\nUSER a 0 * :A\r\n"[..]);
        let lines = decode_all(&mut codec, &mut buf);
        assert_eq!(lines, vec!["PASS secret", "NICK alice", "USER a 0 * :A"]);
    }

    #[test]
    fn decode_interior_cr_is_kept() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"PRIVMSG #t :a\rb\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PRIVMSG #t :a\rb".into()));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&b"NICK \xff\xfe\r\n"[..]);
        assert!(matches!(codec.decode(&mut buf), Err(CodecError::InvalidUtf8)));
    }

    #[test]
    fn encode_appends_crlf() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        codec.encode(":ircserv 001 alice :Welcome".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b":ircserv 001 alice :Welcome\r\n");
    }
}
