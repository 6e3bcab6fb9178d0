//! Server-sent event framing shared by the streaming providers

use crate::provider::{LlmError, LlmResult};
use eventsource_stream::Eventsource;
use futures::StreamExt;

/// One dispatched SSE event. `event` is `None` for unnamed events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl From<eventsource_stream::Event> for SseFrame {
    fn from(ev: eventsource_stream::Event) -> Self {
        let event = Some(ev.event).filter(|name| !name.is_empty() && name != "message");
        Self {
            event,
            data: ev.data,
        }
    }
}

/// Turn an HTTP byte stream into SSE frames. Chunk boundaries may fall
/// anywhere, including inside a multi-byte character.
pub fn frames<S>(bytes_stream: S) -> impl futures::Stream<Item = LlmResult<SseFrame>> + Send
where
    S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
{
    bytes_stream
        .eventsource()
        .map(|event| {
            event
                .map(SseFrame::from)
                .map_err(|e| LlmError::StreamError(e.to_string()))
        })
        .filter(|frame| {
            let keep = !matches!(frame, Ok(f) if f.data.is_empty());
            futures::future::ready(keep)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    async fn collect(chunks: Vec<&[u8]>) -> Vec<SseFrame> {
        let input = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<Bytes, reqwest::Error>(Bytes::copy_from_slice(c)))
                .collect::<Vec<_>>(),
        );
        frames(input)
            .map(|f| f.unwrap())
            .collect::<Vec<_>>()
            .await
    }

    #[tokio::test]
    async fn splits_frames_across_chunks() {
        let frames = collect(vec![
            b"event: message_start\nda".as_slice(),
            b"ta: {\"a\":1}\n\ndata: [DONE]\n\n".as_slice(),
        ])
        .await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("message_start"));
        assert_eq!(frames[0].data, r#"{"a":1}"#);
        assert_eq!(frames[1].event, None);
        assert_eq!(frames[1].data, "[DONE]");
    }

    #[tokio::test]
    async fn handles_crlf_and_skips_comments() {
        let frames = collect(vec![b": keep-alive\r\n\r\ndata: x\r\n\r\n".as_slice()]).await;
        assert_eq!(frames, vec![SseFrame { event: None, data: "x".into() }]);
    }

    #[tokio::test]
    async fn character_split_between_chunks_survives() {
        let payload = "data: café 😊\n\n".as_bytes();
        // cut inside the four-byte emoji
        let cut = payload.len() - 4;
        let (head, tail) = payload.split_at(cut);

        let frames = collect(vec![head, tail]).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "café 😊");
    }

    #[tokio::test]
    async fn multi_line_data_is_joined() {
        let frames = collect(vec![b"data: one\ndata: two\n\n".as_slice()]).await;
        assert_eq!(frames[0].data, "one\ntwo");
    }
}
