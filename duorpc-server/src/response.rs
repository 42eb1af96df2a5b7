//! Response building
//!
//! Every call, successful or not, ends here. The builder applies the
//! version-specific envelope shape and the 2.0 notification rule, then
//! serializes.
//!
//! | request | response body |
//! |---|---|
//! | 1.x, any id | `{"version":"1.1", ["id",] result \| error}` |
//! | 2.0 with id | `{"jsonrpc":"2.0", "id", result \| error}` |
//! | 2.0 without id | nothing ([`Reply::NoContent`]) |

use duorpc_core::{
    codec, Error, ErrorObject, Id, Outcome, ProtocolVersion, Reply, Request, ResponseEnvelope, Result,
};

/// Build the reply for a processed request
pub fn build_response(outcome: Outcome, request: &Request) -> Result<Reply> {
    build_reply(outcome, request.version(), request.id())
}

/// Build a reply from its parts, applying the notification rule
pub fn build_reply(outcome: Outcome, version: &ProtocolVersion, id: Option<&Id>) -> Result<Reply> {
    if version.is_v2() && id.is_none() {
        return Ok(Reply::NoContent);
    }

    let envelope = ResponseEnvelope::new(version, id.cloned(), outcome);
    Ok(Reply::Body(codec::encode_envelope(&envelope)?))
}

/// Error reply for input that never became a [`Request`]
///
/// There is no identifier to honor here, so the notification rule does not
/// apply and a body is always produced.
pub fn error_body(err: &Error, version: &ProtocolVersion) -> Result<Reply> {
    let envelope = ResponseEnvelope::new(version, None, failure(err));
    Ok(Reply::Body(codec::encode_envelope(&envelope)?))
}

/// Failure outcome for a classified error
pub fn failure(err: &Error) -> Outcome {
    Outcome::Failure(ErrorObject::from(err))
}
