//! Best-effort decoding of report files
//!
//! The upstream grading system emits Big5 with no declaration, but files
//! forwarded through other tools show up re-encoded. We try a fixed list of
//! candidate encodings and take the first clean decode.

use crate::error::PipelineError;
use encoding_rs::Encoding;

/// Candidate encodings, in priority order. Big5 first because that is what
/// the grading system natively writes; the GB labels both resolve to the
/// superset GBK decoder.
const CANDIDATE_LABELS: [&str; 4] = ["big5", "utf-8", "gb2312", "gbk"];

/// Decode raw file bytes with the first encoding that accepts them.
///
/// Decoding is strict: an encoding only "wins" if the bytes are fully valid
/// for it, so malformed input falls through to the next candidate instead of
/// being patched with replacement characters. Returns
/// [`PipelineError::NoValidEncoding`] when every candidate fails.
pub fn resolve(bytes: &[u8]) -> Result<String, PipelineError> {
    for label in CANDIDATE_LABELS {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            tracing::debug!(encoding = label, "decoded report file");
            return Ok(text.into_owned());
        }
    }
    Err(PipelineError::NoValidEncoding)
}
