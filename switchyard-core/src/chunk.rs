//! Response chunks written to the caller-visible stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of caller-visible output.
///
/// Serialized with a `type` tag in kebab-case (`{"type":"text","text":"…"}`),
/// which is the shape UI message streams expect. The transport that turns
/// chunks into bytes is supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Chunk {
    /// Plain text.
    Text {
        /// The text payload.
        text: String,
    },
    /// Metadata attached to the message being streamed.
    MessageMetadata {
        /// Arbitrary metadata.
        #[serde(rename = "messageMetadata")]
        message_metadata: Value,
    },
    /// A tool call has started streaming its input.
    ToolInputStart {
        /// Tool call identifier.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Tool name.
        #[serde(rename = "toolName")]
        tool_name: String,
    },
    /// An incremental piece of tool input text.
    ToolInputDelta {
        /// Tool call identifier.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Input text fragment.
        #[serde(rename = "inputTextDelta")]
        input_text_delta: String,
    },
    /// The full tool input is available.
    ToolInputAvailable {
        /// Tool call identifier.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Tool name.
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Tool input.
        input: Value,
    },
    /// The tool output is available.
    ToolOutputAvailable {
        /// Tool call identifier.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Tool output.
        output: Value,
    },
    /// Application-defined data part.
    Data {
        /// Part name, sent as `data-<name>` by most transports.
        name: String,
        /// Payload.
        data: Value,
    },
}

impl Chunk {
    /// Shorthand for a [`Chunk::Text`].
    pub fn text(text: impl Into<String>) -> Self {
        Chunk::Text { text: text.into() }
    }

    /// The text payload, if this is a text chunk.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Chunk::Text { text } => Some(text),
            _ => None,
        }
    }
}
