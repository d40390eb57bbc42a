//! # Stream Writer
//!
//! [`StreamWriter`] is a convenience layer over a [`ResponseSink`] for the
//! chunk sequences handlers write most often: plain text, message metadata and
//! synthetic tool calls that show up in a UI as if a model had made them.

use serde_json::Value;
use std::sync::Arc;
use switchyard_core::{Chunk, IdGenerator, ResponseSink, SinkError};
use thiserror::Error;

/// Errors returned by [`StreamWriter`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    /// The underlying sink rejected the write.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// `write_object_as_tool` was given `null`.
    #[error("object is required for tool `{0}`")]
    MissingObject(String),
}

/// A tool call written directly to the stream, without a model in the loop.
#[derive(Debug, Clone, Default)]
pub struct CustomToolCall {
    /// Tool name, also used as the prefix of generated call ids.
    pub tool_name: String,
    /// Explicit call id; one is generated when absent.
    pub tool_call_id: Option<String>,
    /// Incremental input text, written as `tool-input-delta` chunks.
    pub input_text_delta: Vec<String>,
    /// Final input, written as `tool-input-available`.
    pub input: Option<Value>,
    /// Output, written as `tool-output-available`.
    pub output: Option<Value>,
}

impl CustomToolCall {
    /// A call for `tool_name` with nothing attached yet.
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            ..Self::default()
        }
    }

    /// Attach the input.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Attach the output.
    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }
}

/// Writes common chunk sequences to a sink.
#[derive(Clone)]
pub struct StreamWriter {
    sink: Arc<dyn ResponseSink>,
    ids: Arc<dyn IdGenerator>,
}

impl StreamWriter {
    /// Create a writer over `sink`, using `ids` for generated identifiers.
    pub fn new(sink: Arc<dyn ResponseSink>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { sink, ids }
    }

    /// The underlying sink.
    pub fn sink(&self) -> &Arc<dyn ResponseSink> {
        &self.sink
    }

    /// Generate a fresh identifier.
    pub fn generate_id(&self) -> String {
        self.ids.generate_id()
    }

    /// Write a raw chunk.
    pub fn write(&self, chunk: Chunk) -> Result<(), SinkError> {
        self.sink.write(chunk)
    }

    /// Write a text chunk.
    pub fn write_text(&self, text: impl Into<String>) -> Result<(), SinkError> {
        self.sink.write(Chunk::text(text))
    }

    /// Write an application data part.
    pub fn write_data(&self, name: impl Into<String>, data: Value) -> Result<(), SinkError> {
        self.sink.write(Chunk::Data {
            name: name.into(),
            data,
        })
    }

    /// Write message metadata.
    pub fn write_message_metadata(&self, metadata: Value) -> Result<(), SinkError> {
        self.sink.write(Chunk::MessageMetadata {
            message_metadata: metadata,
        })
    }

    /// Write a synthetic tool call and return its call id.
    ///
    /// Chunks are written in lifecycle order: `tool-input-start` and deltas
    /// (when there are deltas or an output), then `tool-input-available` (when
    /// there is an input), then `tool-output-available` (when there is an
    /// output).
    pub fn write_custom_tool(&self, call: CustomToolCall) -> Result<String, SinkError> {
        let tool_call_id = call
            .tool_call_id
            .unwrap_or_else(|| format!("{}-{}", call.tool_name, self.generate_id()));

        if !call.input_text_delta.is_empty() || call.output.is_some() {
            self.sink.write(Chunk::ToolInputStart {
                tool_call_id: tool_call_id.clone(),
                tool_name: call.tool_name.clone(),
            })?;
            for delta in call.input_text_delta {
                self.sink.write(Chunk::ToolInputDelta {
                    tool_call_id: tool_call_id.clone(),
                    input_text_delta: delta,
                })?;
            }
        }

        if let Some(input) = call.input {
            self.sink.write(Chunk::ToolInputAvailable {
                tool_call_id: tool_call_id.clone(),
                tool_name: call.tool_name,
                input,
            })?;
        }

        if let Some(output) = call.output {
            self.sink.write(Chunk::ToolOutputAvailable {
                tool_call_id: tool_call_id.clone(),
                output,
            })?;
        }

        Ok(tool_call_id)
    }

    /// Present a structured object as the output of a tool call.
    ///
    /// Writes `tool-input-start`, `tool-input-available` and
    /// `tool-output-available`; `input` carries whatever produced the object
    /// (a prompt, usage figures and so on).
    pub fn write_object_as_tool(
        &self,
        tool_name: impl Into<String>,
        object: Value,
        input: Value,
    ) -> Result<String, WriterError> {
        let tool_name = tool_name.into();
        if object.is_null() {
            return Err(WriterError::MissingObject(tool_name));
        }

        let call = CustomToolCall::new(tool_name)
            .with_input(input)
            .with_output(object);
        Ok(self.write_custom_tool(call)?)
    }
}

impl std::fmt::Debug for StreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("closed", &self.sink.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, SequentialIds};
    use serde_json::json;

    fn writer() -> (StreamWriter, RecordingSink) {
        let sink = RecordingSink::new();
        let writer = StreamWriter::new(Arc::new(sink.clone()), Arc::new(SequentialIds::new("id")));
        (writer, sink)
    }

    #[test]
    fn test_custom_tool_lifecycle_order() {
        let (writer, sink) = writer();
        let id = writer
            .write_custom_tool(
                CustomToolCall::new("search")
                    .with_input(json!({"q": "rust"}))
                    .with_output(json!({"hits": 2})),
            )
            .unwrap();

        assert_eq!(id, "search-id-1");
        let kinds: Vec<String> = sink
            .chunks()
            .iter()
            .map(|c| serde_json::to_value(c).unwrap()["type"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "tool-input-start",
                "tool-input-available",
                "tool-output-available"
            ]
        );
    }

    #[test]
    fn test_input_only_tool_skips_start() {
        let (writer, sink) = writer();
        let call = CustomToolCall {
            tool_call_id: Some("fixed".into()),
            ..CustomToolCall::new("lookup").with_input(json!({}))
        };
        assert_eq!(writer.write_custom_tool(call).unwrap(), "fixed");
        assert_eq!(sink.chunks().len(), 1);
    }

    #[test]
    fn test_object_as_tool() {
        let (writer, sink) = writer();
        writer
            .write_object_as_tool("summary", json!({"title": "t"}), json!({"prompt": "p"}))
            .unwrap();
        assert_eq!(
            sink.chunks(),
            vec![
                Chunk::ToolInputStart {
                    tool_call_id: "summary-id-1".into(),
                    tool_name: "summary".into(),
                },
                Chunk::ToolInputAvailable {
                    tool_call_id: "summary-id-1".into(),
                    tool_name: "summary".into(),
                    input: json!({"prompt": "p"}),
                },
                Chunk::ToolOutputAvailable {
                    tool_call_id: "summary-id-1".into(),
                    output: json!({"title": "t"}),
                },
            ]
        );

        assert_eq!(
            writer.write_object_as_tool("empty", Value::Null, Value::Null),
            Err(WriterError::MissingObject("empty".into()))
        );
    }
}
