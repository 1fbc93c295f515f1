//! Voice search for the resource locator pickers

use tracing::{debug, instrument};

use crate::error::VoiceAiError;
use crate::request::{HttpMethod, PreparedRequest};
use crate::transport::HttpTransport;
use crate::types::{ListSearchEntry, ListSearchResult, Voice};

/// Request listing every voice of the account
#[must_use]
pub fn list_voices_request() -> PreparedRequest {
    let mut request = PreparedRequest::new(HttpMethod::Get, "/voices");
    request.set_header("Accept", "application/json");
    request
}

/// Filter voices by name and map them to picker entries
///
/// Matching is a case-insensitive substring test; `None` or an empty filter
/// keeps every voice. API order is preserved.
#[must_use]
pub fn voice_search_results(voices: Vec<Voice>, filter: Option<&str>) -> ListSearchResult {
    let needle = filter
        .map(str::to_lowercase)
        .filter(|f| !f.is_empty());

    let results = voices
        .into_iter()
        .filter(|voice| {
            needle
                .as_deref()
                .is_none_or(|n| voice.name.to_lowercase().contains(n))
        })
        .map(|voice| ListSearchEntry {
            name: format!("{} ({})", voice.name, voice.status),
            value: voice.voice_id,
        })
        .collect();

    ListSearchResult { results }
}

/// Fetch all voices and return those matching `filter`
#[instrument(skip(transport))]
pub async fn list_voices(
    transport: &dyn HttpTransport,
    filter: Option<&str>,
) -> Result<ListSearchResult, VoiceAiError> {
    let response = transport.send(list_voices_request()).await?;
    let voices: Vec<Voice> = response.json()?;
    let total = voices.len();

    let result = voice_search_results(voices, filter);
    debug!(total, matched = result.results.len(), "Voice search complete");

    Ok(result)
}
