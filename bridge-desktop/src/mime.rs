//! MIME Type Mapping
//!
//! Translates between Symphonia codec identifiers and the MIME strings used
//! across the bridge contracts.

use bridge_traits::format::MIMETYPE_AUDIO_RAW;
use bridge_traits::extractor::ContentLocator;
use std::borrow::Cow;
use symphonia::core::codecs::{self, CodecType};
use symphonia::core::probe::Hint;
use tracing::debug;

const CODEC_MIME_TABLE: &[(CodecType, &str)] = &[
    (codecs::CODEC_TYPE_MP3, "audio/mpeg"),
    (codecs::CODEC_TYPE_AAC, "audio/mp4a-latm"),
    (codecs::CODEC_TYPE_FLAC, "audio/flac"),
    (codecs::CODEC_TYPE_VORBIS, "audio/vorbis"),
    (codecs::CODEC_TYPE_OPUS, "audio/opus"),
    (codecs::CODEC_TYPE_ALAC, "audio/alac"),
    (codecs::CODEC_TYPE_PCM_S16LE, MIMETYPE_AUDIO_RAW),
    (codecs::CODEC_TYPE_PCM_S16BE, "audio/x-pcm-s16be"),
    (codecs::CODEC_TYPE_PCM_U8, "audio/x-pcm-u8"),
    (codecs::CODEC_TYPE_PCM_S24LE, "audio/x-pcm-s24le"),
    (codecs::CODEC_TYPE_PCM_S24BE, "audio/x-pcm-s24be"),
    (codecs::CODEC_TYPE_PCM_S32LE, "audio/x-pcm-s32le"),
    (codecs::CODEC_TYPE_PCM_S32BE, "audio/x-pcm-s32be"),
    (codecs::CODEC_TYPE_PCM_F32LE, "audio/x-pcm-f32le"),
    (codecs::CODEC_TYPE_PCM_F32BE, "audio/x-pcm-f32be"),
    (codecs::CODEC_TYPE_PCM_F64LE, "audio/x-pcm-f64le"),
    (codecs::CODEC_TYPE_PCM_F64BE, "audio/x-pcm-f64be"),
    (codecs::CODEC_TYPE_PCM_ALAW, "audio/g711-alaw"),
    (codecs::CODEC_TYPE_PCM_MULAW, "audio/g711-mlaw"),
    (codecs::CODEC_TYPE_ADPCM_IMA_WAV, "audio/x-adpcm-ima"),
    (codecs::CODEC_TYPE_ADPCM_MS, "audio/x-adpcm-ms"),
];

/// Prefix of the MIME types given to codecs outside the table.
pub const UNMAPPED_MIME_PREFIX: &str = "audio/x-symphonia-";

/// MIME type for a Symphonia codec.
///
/// Codecs outside the table get a synthetic `audio/x-symphonia-0x<id>` type,
/// which no decoder factory accepts.
pub fn mime_for_codec(codec: CodecType) -> Cow<'static, str> {
    CODEC_MIME_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == codec)
        .map(|(_, mime)| Cow::Borrowed(*mime))
        .unwrap_or_else(|| Cow::Owned(format!("{}{}", UNMAPPED_MIME_PREFIX, codec)))
}

/// Symphonia codec for a MIME type. Matching ignores ASCII case.
pub fn codec_for_mime(mime: &str) -> Option<CodecType> {
    CODEC_MIME_TABLE
        .iter()
        .find(|(_, candidate)| candidate.eq_ignore_ascii_case(mime))
        .map(|(codec, _)| *codec)
}

/// Create a format hint from the locator's file extension.
pub(crate) fn hint_for(locator: &ContentLocator) -> Hint {
    let mut hint = Hint::new();

    if let Some(extension) = locator.extension() {
        debug!("Setting format hint extension: {}", extension);
        hint.with_extension(&extension);
    } else {
        debug!("No file extension found, format will be auto-detected");
    }

    hint
}
