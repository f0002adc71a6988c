use serde::{Deserialize, Serialize};

/// The structured document returned to the tool caller.
///
/// Every exit path of the gateway produces one of these; internal error
/// types are rendered to text at this boundary and never cross it verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolReply {
    pub is_error: bool,
    pub content: Vec<ToolContent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolContent {
    Text { text: String },
    Resource { resource: ResourceContents },
}

/// An embedded document with a descriptive URI, for payloads the caller is
/// expected to parse rather than read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

// === impl ToolReply ===

impl ToolReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    pub fn resource(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::Resource {
                resource: ResourceContents {
                    uri: uri.into(),
                    mime_type: mime_type.into(),
                    text: text.into(),
                },
            }],
        }
    }

    /// The first text payload, if any. Convenient for assertions and logs.
    pub fn message(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Resource { .. } => None,
        })
    }
}
