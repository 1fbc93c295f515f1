//! Request and response hooks
//!
//! - [`pre_send_clone_voice`] rewrites the clone-voice request into a
//!   multipart upload.
//! - [`return_binary_data`] turns a raw audio response into binary
//!   attachments.
//!
//! Both receive everything they touch as arguments and perform no I/O.

use tracing::{debug, instrument};

use crate::error::VoiceAiError;
use crate::parameters::NodeParameters;
use crate::request::{FullResponse, MultipartForm, PreparedRequest, RequestBody};
use crate::types::{AudioFormat, BinaryData, ExecutionItem, VoiceVisibility};

/// Binary property the converter writes to
pub const OUTPUT_BINARY_PROPERTY: &str = "data";

/// Binary property read by the clone hook when `audioFile` is unset
pub const DEFAULT_AUDIO_PROPERTY: &str = "data";

/// File name used when the uploaded binary has none
pub const FALLBACK_UPLOAD_FILE_NAME: &str = "audio.mp3";

/// Convert a speech response into one binary item per input item
///
/// Each output item carries the response headers as JSON and the body as
/// `speech.<format>` under [`OUTPUT_BINARY_PROPERTY`].
#[instrument(skip_all, fields(items = items.len(), body_size = response.body.len()))]
pub fn return_binary_data(
    items: &[ExecutionItem],
    response: &FullResponse,
    params: &NodeParameters,
) -> Result<Vec<ExecutionItem>, VoiceAiError> {
    let format_option = params.string("additionalOptions.audioFormat")?;
    let format = AudioFormat::from_option(format_option.as_deref());

    let binary = BinaryData::new(response.body.clone(), format.mime_type())
        .with_file_name(format!("speech.{}", format.extension()));

    debug!(mime_type = %binary.mime_type, "Prepared speech attachment");

    let headers = response.headers_json();

    Ok(items
        .iter()
        .map(|_| {
            ExecutionItem::from_json(headers.clone())
                .with_binary(OUTPUT_BINARY_PROPERTY, binary.clone())
        })
        .collect())
}

/// Replace the request body with the clone-voice multipart form
///
/// The form holds `file` (the item's binary, named `audio.mp3` when it has
/// no file name) and `name`, followed by `voice_visibility` and `language`
/// when those options are set.
#[instrument(skip_all)]
pub fn pre_send_clone_voice(
    mut request: PreparedRequest,
    params: &NodeParameters,
    item: &ExecutionItem,
) -> Result<PreparedRequest, VoiceAiError> {
    let voice_name = params.required_string("voiceName")?;
    let property = params.string_or("audioFile", DEFAULT_AUDIO_PROPERTY)?;
    let options = NodeParameters::new(params.collection("additionalOptions")?);

    let binary = item.binary_data(&property)?;
    let file_name = binary
        .file_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_UPLOAD_FILE_NAME);

    let mut form = MultipartForm::new()
        .file("file", file_name, binary.mime_type.clone(), binary.data.clone())
        .text("name", voice_name);

    if let Some(visibility) = options.string("voiceVisibility")?.filter(|v| !v.is_empty()) {
        let visibility: VoiceVisibility = visibility.parse().map_err(|reason: String| {
            VoiceAiError::invalid_parameter("additionalOptions.voiceVisibility", reason)
        })?;
        form = form.text("voice_visibility", visibility.as_str());
    }

    if let Some(language) = options.string("language")?.filter(|l| !l.is_empty()) {
        form = form.text("language", language);
    }

    debug!(
        property = %property,
        file_name = %file_name,
        file_size = binary.size_bytes(),
        fields = form.parts().len(),
        "Built clone-voice form"
    );

    request.body = RequestBody::Multipart(form);
    Ok(request)
}
