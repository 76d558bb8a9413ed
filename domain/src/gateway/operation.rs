//! Parsing of Operation API payloads.
//!
//! Payloads are decoded into a dynamic JSON map first and every level of the
//! recognition result is type-checked explicitly. A malformed chunk or alternative
//! is skipped with a warning so the rest of the transcript survives; only a broken
//! top-level shape fails the whole extraction.

use log::*;
use serde_json::{Map, Value};
use speech_ai::types::recognition::{
    Alternative, Chunk, OperationHandle, OperationStatus, Transcript,
};
use speech_ai::Error;

pub type JsonMap = Map<String, Value>;

/// Decode a response body into a JSON object.
pub fn parse(bytes: &[u8]) -> Result<JsonMap, Error> {
    serde_json::from_slice::<JsonMap>(bytes)
        .map_err(|e| Error::Deserialization(format!("Invalid operation payload: {e}")))
}

/// Extract the operation handle (`id`) from a submission response.
pub fn operation_id(payload: &JsonMap) -> Result<OperationHandle, Error> {
    match payload.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(OperationHandle::new(id.clone())),
        Some(Value::String(_)) => Err(Error::Deserialization(
            "Operation id is empty".to_string(),
        )),
        Some(other) => Err(Error::Deserialization(format!(
            "Operation id is not a string: {other}"
        ))),
        None => Err(Error::Deserialization(
            "Response has no operation id".to_string(),
        )),
    }
}

/// Interpret a status payload.
///
/// A missing or non-boolean `done` counts as still running. A finished operation
/// carrying an `error` object is reported as [`Error::Provider`].
pub fn operation_status(payload: &JsonMap) -> Result<OperationStatus, Error> {
    let done = payload
        .get("done")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !done {
        return Ok(OperationStatus::Running);
    }

    if let Some(error) = payload.get("error") {
        return Err(Error::Provider(describe_operation_error(error)));
    }

    let response = payload.get("response").ok_or_else(|| {
        Error::Deserialization("Finished operation has no response".to_string())
    })?;

    extract_transcript(response).map(OperationStatus::Done)
}

/// Extract `chunks[].alternatives[].text` from an operation response.
///
/// An absent `chunks` field yields an empty transcript: the API omits empty
/// repeated fields, which is what a recording without speech produces.
pub fn extract_transcript(response: &Value) -> Result<Transcript, Error> {
    let response = response.as_object().ok_or_else(|| {
        Error::Deserialization("Operation response is not an object".to_string())
    })?;

    let chunks = match response.get("chunks") {
        None => return Ok(Transcript::default()),
        Some(Value::Array(chunks)) => chunks,
        Some(_) => {
            return Err(Error::Deserialization(
                "Operation response chunks is not an array".to_string(),
            ))
        }
    };

    let mut transcript = Transcript::default();
    for (index, chunk) in chunks.iter().enumerate() {
        match extract_chunk(chunk) {
            Ok(chunk) => transcript.chunks.push(chunk),
            Err(reason) => warn!("Skipping malformed chunk {index}: {reason}"),
        }
    }

    Ok(transcript)
}

fn extract_chunk(chunk: &Value) -> Result<Chunk, &'static str> {
    let alternatives = chunk
        .as_object()
        .ok_or("chunk is not an object")?
        .get("alternatives")
        .ok_or("chunk has no alternatives")?
        .as_array()
        .ok_or("alternatives is not an array")?;

    let alternatives = alternatives
        .iter()
        .enumerate()
        .filter_map(|(index, alternative)| {
            match alternative.get("text").and_then(Value::as_str) {
                Some(text) => Some(Alternative {
                    text: text.to_string(),
                }),
                None => {
                    warn!("Skipping alternative {index} without text");
                    None
                }
            }
        })
        .collect();

    Ok(Chunk { alternatives })
}

fn describe_operation_error(error: &Value) -> String {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("operation failed");
    match error.get("code").and_then(Value::as_i64) {
        Some(code) => format!("{message} (code {code})"),
        None => message.to_string(),
    }
}
