//! Server-sent events framing.

/// One dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field; `None` means the default `message` event.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

/// Remove the next complete frame from `buffer`.
///
/// Frames are separated by a blank line. Returns `None`, leaving the buffer
/// intact, if no complete frame has arrived yet.
pub(crate) fn extract_frame(buffer: &mut String) -> Option<String> {
    if buffer.contains('\r') {
        *buffer = buffer.replace("\r\n", "\n");
    }
    let idx = buffer.find("\n\n")?;
    let frame = buffer.get(..idx).map(str::to_owned);
    buffer.replace_range(..idx + 2, "");
    frame
}

/// Parse one frame's lines.
///
/// Comment lines (leading `:`) and unknown fields are ignored. Frames with no
/// `data:` field are not dispatched.
pub(crate) fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Option<String> = None;

    for line in raw.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_owned()).filter(|v| !v.is_empty()),
            "data" => match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_owned()),
            },
            _ => {}
        }
    }

    data.map(|data| SseFrame { event, data })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_frame_splits_on_blank_line() {
        let mut buffer = "event: a\ndata: {}\n\nevent: b\ndata: {}\n\n".to_string();

        assert_eq!(extract_frame(&mut buffer).unwrap(), "event: a\ndata: {}");
        assert_eq!(extract_frame(&mut buffer).unwrap(), "event: b\ndata: {}");
        assert!(extract_frame(&mut buffer).is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_extract_frame_incomplete_keeps_buffer() {
        let mut buffer = "event: a\ndata: {\"partial".to_string();
        assert!(extract_frame(&mut buffer).is_none());
        assert_eq!(buffer, "event: a\ndata: {\"partial");
    }

    #[test]
    fn test_extract_frame_handles_crlf() {
        let mut buffer = "event: a\r\ndata: 1\r\n\r\n".to_string();
        assert_eq!(extract_frame(&mut buffer).unwrap(), "event: a\ndata: 1");
    }

    #[test]
    fn test_parse_frame_named_event() {
        let frame = parse_frame("event: stock-updated\ndata: {\"productId\":\"p1\"}").unwrap();
        assert_eq!(frame.event.as_deref(), Some("stock-updated"));
        assert_eq!(frame.data, "{\"productId\":\"p1\"}");
    }

    #[test]
    fn test_parse_frame_joins_data_lines_and_skips_comments() {
        let frame = parse_frame(": keep-alive\ndata: line one\ndata:line two").unwrap();
        assert!(frame.event.is_none());
        assert_eq!(frame.data, "line one\nline two");
    }

    #[test]
    fn test_parse_frame_without_data_is_dropped() {
        assert!(parse_frame(": ping").is_none());
        assert!(parse_frame("event: notification").is_none());
        assert!(parse_frame("").is_none());
    }
}
