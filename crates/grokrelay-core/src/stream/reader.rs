//! Chunked byte stream to event stream adapter.

use super::decoder::{decode_line, DecodeState};
use super::StreamEvent;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use grokrelay_types::UpstreamError;

/// Decode a chunked upstream byte stream into a lazy event sequence.
///
/// Single-pass and non-restartable; consumers fold it incrementally. Lines
/// may straddle chunk boundaries, so bytes are buffered until a newline
/// lands. Input is abandoned as soon as the terminator is seen. A transport
/// error mid-stream ends the sequence without a terminator; the caller
/// sees the partial fold and treats the outcome as neutral.
pub fn decode_stream<S>(mut upstream: S) -> impl Stream<Item = StreamEvent> + Send
where
    S: Stream<Item = Result<Bytes, UpstreamError>> + Send + Unpin + 'static,
{
    async_stream::stream! {
        let mut buffer = BytesMut::new();
        let mut state = DecodeState::AwaitingLine;

        'outer: while let Some(item) = upstream.next().await {
            match item {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);

                    // Process complete lines from the buffer
                    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_raw = buffer.split_to(pos + 1);
                        let Ok(line) = std::str::from_utf8(&line_raw) else {
                            tracing::debug!("Dropping non-UTF-8 stream line");
                            continue;
                        };

                        let (next_state, event) = decode_line(state, line);
                        state = next_state;
                        if let Some(event) = event {
                            let done = event == StreamEvent::Terminator;
                            if event == StreamEvent::Malformed {
                                tracing::debug!("Malformed stream line skipped");
                            }
                            yield event;
                            if done {
                                break 'outer;
                            }
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!("Upstream stream interrupted: {}", e);
                    break;
                },
            }
        }

        // A final line may arrive without a trailing newline.
        if state != DecodeState::Terminated && !buffer.is_empty() {
            if let Ok(line) = std::str::from_utf8(&buffer) {
                let (_, event) = decode_line(state, line);
                if let Some(event) = event {
                    yield event;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, UpstreamError>> + Unpin {
        let items: Vec<Result<Bytes, UpstreamError>> =
            parts.iter().map(|p| Ok(Bytes::from(p.to_string()))).collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let source = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"hi\"}}]}\ndata: [DONE]\n",
        ]);
        let events: Vec<StreamEvent> = decode_stream(source).collect().await;
        assert_eq!(
            events,
            vec![
                StreamEvent::ContentDelta { text: "hi".to_string() },
                StreamEvent::Terminator
            ]
        );
    }

    #[tokio::test]
    async fn test_input_abandoned_after_terminator() {
        let source = chunks(&[
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        ]);
        let events: Vec<StreamEvent> = decode_stream(source).collect().await;
        assert_eq!(events, vec![StreamEvent::Terminator]);
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_abort() {
        let source = chunks(&[
            "data: {broken\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\ndata: [DONE]\n",
        ]);
        let events: Vec<StreamEvent> = decode_stream(source).collect().await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Malformed,
                StreamEvent::ContentDelta { text: "ok".to_string() },
                StreamEvent::Terminator
            ]
        );
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let source = chunks(&["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]);
        let events: Vec<StreamEvent> = decode_stream(source).collect().await;
        assert_eq!(events, vec![StreamEvent::ContentDelta { text: "tail".to_string() }]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream_quietly() {
        let items: Vec<Result<Bytes, UpstreamError>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n",
            )),
            Err(UpstreamError::transport("connection reset")),
        ];
        let events: Vec<StreamEvent> = decode_stream(stream::iter(items)).collect().await;
        assert_eq!(
            events,
            vec![StreamEvent::ContentDelta { text: "partial".to_string() }],
            "no terminator: caller observes a partial fold"
        );
    }
}
