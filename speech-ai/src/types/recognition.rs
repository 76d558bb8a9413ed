//! Types for long-running recognition operations.

use std::fmt;

/// Separator placed between recognized alternatives in the final transcript.
pub const TRANSCRIPT_SEPARATOR: &str = ". ";

/// Configuration for submitting a long-running recognition job.
///
/// The audio must already be readable by the provider at `audio_uri`.
/// `model` and `profanity_filter` are left to provider defaults when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub audio_uri: String,
    pub language_code: String,
    pub model: Option<String>,
    pub profanity_filter: Option<bool>,
}

impl RecognitionRequest {
    pub fn new(audio_uri: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            audio_uri: audio_uri.into(),
            language_code: language_code.into(),
            model: None,
            profanity_filter: None,
        }
    }
}

/// Opaque identifier of a submitted operation. Only ever used as a poll key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One candidate transcription of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub text: String,
}

/// A recognized audio segment with its candidate transcriptions, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub alternatives: Vec<Alternative>,
}

/// Recognition result of a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub chunks: Vec<Chunk>,
}

impl Transcript {
    /// Texts of every alternative, in chunk order and then alternative order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.alternatives.iter())
            .map(|alternative| alternative.text.as_str())
    }

    /// All alternative texts joined with [`TRANSCRIPT_SEPARATOR`].
    pub fn text(&self) -> String {
        self.texts().collect::<Vec<_>>().join(TRANSCRIPT_SEPARATOR)
    }
}

/// State of an operation as reported by a single status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// `done` was false or absent.
    Running,
    /// `done` was true and the response carried a transcript.
    Done(Transcript),
}

impl OperationStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, OperationStatus::Done(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(texts: &[&str]) -> Chunk {
        Chunk {
            alternatives: texts
                .iter()
                .map(|text| Alternative {
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_text_joins_every_alternative_in_order() {
        let transcript = Transcript {
            chunks: vec![chunk(&["hello"]), chunk(&["world", "ignored"])],
        };

        assert_eq!(transcript.text(), "hello. world. ignored");
    }

    #[test]
    fn test_empty_transcript_renders_empty_text() {
        assert_eq!(Transcript::default().text(), "");
        assert_eq!(
            Transcript {
                chunks: vec![Chunk::default()]
            }
            .text(),
            ""
        );
    }

    #[test]
    fn test_operation_handle_displays_raw_id() {
        let handle = OperationHandle::new("e03sup6d5h7rq574ht8g");
        assert_eq!(handle.to_string(), "e03sup6d5h7rq574ht8g");
        assert_eq!(handle.as_str(), "e03sup6d5h7rq574ht8g");
    }
}
