use std::pin::pin;

use futures_util::{Stream, StreamExt};

use crate::{
    error::BedrockError,
    event::{ChunkDecoder, ContentDeltaDecoder},
    sink::TextSink,
};

/// Collects the text of one streaming call.
///
/// Every chunk is decoded, its fragment (if any) is emitted to the sink and
/// then appended to the buffer, before the next chunk is looked at. The
/// accumulator is consumed by [`consume`](Self::consume), so a buffer never
/// outlives or is shared beyond the call that owns it.
///
/// The first error poisons the accumulator: later pushes are refused and
/// [`finish`](Self::finish) reports the failure instead of partial text.
#[derive(Debug)]
pub struct StreamingTextAccumulator<S, D = ContentDeltaDecoder> {
    decoder: D,
    sink: S,
    buffer: String,
    failure: Option<String>,
}

impl<S: TextSink> StreamingTextAccumulator<S> {
    /// Accumulator for model response streams (`content_block_delta` events).
    pub fn new(sink: S) -> Self {
        Self::with_decoder(ContentDeltaDecoder, sink)
    }
}

impl<S: TextSink, D: ChunkDecoder> StreamingTextAccumulator<S, D> {
    pub fn with_decoder(decoder: D, sink: S) -> Self {
        Self {
            decoder,
            sink,
            buffer: String::new(),
            failure: None,
        }
    }

    /// Feeds one chunk, for transports that push chunks through a callback.
    ///
    /// Once a chunk has failed, every later push returns
    /// [`BedrockError::Aborted`] without decoding or emitting anything.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), BedrockError> {
        if let Some(failure) = &self.failure {
            return Err(BedrockError::Aborted(failure.clone()));
        }

        match self.decoder.decode(chunk) {
            Ok(Some(fragment)) => {
                self.sink.emit(&fragment);
                self.buffer.push_str(&fragment);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Marks the call as failed, e.g. when a callback transport reports a
    /// transport error of its own. Only the first failure is kept.
    pub fn fail(&mut self, error: BedrockError) -> BedrockError {
        if self.failure.is_none() {
            self.failure = Some(error.to_string());
        }
        error
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Whether a chunk or the transport has failed.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Ends the call and hands out the full text, or the failure that
    /// stopped it.
    pub fn finish(self) -> Result<String, BedrockError> {
        match self.failure {
            Some(failure) => Err(BedrockError::Aborted(failure)),
            None => Ok(self.buffer),
        }
    }

    /// Drains `chunks` until it ends and returns the concatenated text.
    ///
    /// The first decode, schema or transport error aborts the call and the
    /// partial text is dropped with the accumulator. Dropping the returned
    /// future stops processing at the next suspension point.
    pub async fn consume<St, B, E>(mut self, chunks: St) -> Result<String, BedrockError>
    where
        St: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<BedrockError>,
    {
        let mut chunks = pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|error| self.fail(error.into()))?;
            self.push(chunk.as_ref())?;
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Utf8Decoder;
    use futures_util::stream;

    fn delta(text: &str) -> Result<Vec<u8>, BedrockError> {
        Ok(serde_json::to_vec(&serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": text }
        }))
        .unwrap())
    }

    fn event(kind: &str) -> Result<Vec<u8>, BedrockError> {
        Ok(format!(r#"{{"type":"{kind}"}}"#).into_bytes())
    }

    #[test]
    fn test_push_emits_and_appends() {
        let mut emitted = Vec::new();
        let mut accumulator = StreamingTextAccumulator::new(|fragment: &str| {
            emitted.push(fragment.to_string());
        });

        accumulator.push(&delta("Hel").unwrap()).unwrap();
        assert_eq!(accumulator.text(), "Hel");
        accumulator.push(&delta("lo").unwrap()).unwrap();
        let text = accumulator.finish().unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(emitted, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_push_after_malformed_chunk_is_refused() {
        let mut emitted = Vec::new();
        let mut accumulator = StreamingTextAccumulator::new(|fragment: &str| {
            emitted.push(fragment.to_string());
        });

        accumulator.push(&delta("Hel").unwrap()).unwrap();
        let err = accumulator.push(b"garbage").unwrap_err();
        assert!(matches!(err, BedrockError::Decode(_)));
        assert!(accumulator.is_failed());

        let err = accumulator.push(&delta("lo").unwrap()).unwrap_err();
        assert!(matches!(err, BedrockError::Aborted(_)));
        assert_eq!(accumulator.text(), "Hel");

        let err = accumulator.finish().unwrap_err();
        assert!(matches!(err, BedrockError::Aborted(ref reason) if reason.contains("decode")));
        assert_eq!(emitted, vec!["Hel"]);
    }

    #[test]
    fn test_finish_after_transport_failure() {
        let mut accumulator = StreamingTextAccumulator::new(|_: &str| {});
        accumulator.push(&delta("partial").unwrap()).unwrap();

        let err = accumulator.fail(BedrockError::Transport("connection reset".to_string()));
        assert!(matches!(err, BedrockError::Transport(_)));
        accumulator.fail(BedrockError::Decode("later".to_string()));

        let err = accumulator.finish().unwrap_err();
        assert!(matches!(err, BedrockError::Aborted(ref reason) if reason.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_consume_skips_other_events() {
        let chunks = stream::iter(vec![
            event("message_start"),
            event("content_block_start"),
            delta("The "),
            event("ping"),
            delta("answer"),
            event("content_block_stop"),
            event("message_delta"),
            event("message_stop"),
        ]);

        let text = StreamingTextAccumulator::new(|_: &str| {})
            .consume(chunks)
            .await
            .unwrap();
        assert_eq!(text, "The answer");
    }

    #[tokio::test]
    async fn test_transport_error_discards_buffer() {
        let mut emitted = String::new();
        let chunks = stream::iter(vec![
            delta("partial"),
            Err(BedrockError::Transport("connection reset".to_string())),
            delta("never seen"),
        ]);

        let result = StreamingTextAccumulator::new(|fragment: &str| emitted.push_str(fragment))
            .consume(chunks)
            .await;

        assert!(matches!(result, Err(BedrockError::Transport(_))));
        assert_eq!(emitted, "partial");
    }

    #[tokio::test]
    async fn test_stops_at_first_malformed_chunk() {
        let mut emitted = Vec::new();
        let chunks = stream::iter(vec![
            delta("ok"),
            Ok(b"not json".to_vec()),
            delta("after"),
        ]);

        let result = StreamingTextAccumulator::new(|fragment: &str| {
            emitted.push(fragment.to_string());
        })
        .consume(chunks)
        .await;

        assert!(matches!(result, Err(BedrockError::Decode(_))));
        assert_eq!(emitted, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_utf8_decoder_accumulates_raw_text() {
        let chunks = stream::iter(vec![
            Ok::<_, BedrockError>("Agent ".as_bytes()),
            Ok("says ".as_bytes()),
            Ok("hi".as_bytes()),
        ]);

        let text = StreamingTextAccumulator::with_decoder(Utf8Decoder, |_: &str| {})
            .consume(chunks)
            .await
            .unwrap();
        assert_eq!(text, "Agent says hi");
    }

    #[tokio::test]
    async fn test_channel_sink_receives_fragments_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let chunks = stream::iter(vec![delta("a"), delta("b"), delta("c")]);

        let text = StreamingTextAccumulator::new(tx).consume(chunks).await.unwrap();

        let mut received = Vec::new();
        while let Some(fragment) = rx.recv().await {
            received.push(fragment);
        }
        assert_eq!(text, "abc");
        assert_eq!(received, vec!["a", "b", "c"]);
    }
}
