//! Lossless encoding of review sessions into rendered artifacts.
//!
//! The rendering is a description (the marker telling which kind of session it is) and
//! a list of named fields. Decoding looks fields up by name, so their order does not
//! matter and fields it does not know about are skipped.

use std::str::FromStr;
use tally_core::{
    ArtifactIdentity, DomainFields, RenderedField, RenderedState, ReviewItem, ReviewState,
    SessionHandle, SessionKind,
};
use tally_error::{CodecError, CodecErrorKind};

/// Result of decoding an artifact.
pub type CodecResult<T> = Result<T, CodecError>;

/// Field holding the event name.
pub const FIELD_EVENT: &str = "Event";
/// Field holding the event id.
pub const FIELD_EVENT_ID: &str = "Event ID";
/// Field holding the submitter's display name.
pub const FIELD_USER: &str = "User";
/// Field holding the submission id.
pub const FIELD_SUBMISSION_ID: &str = "Submission ID";
/// Field holding the in-game name.
pub const FIELD_IGN: &str = "IGN";
/// Field holding the claimed score.
pub const FIELD_SCORE: &str = "Scores Claimed";
/// Field holding the review state.
pub const FIELD_STATUS: &str = "Status";
/// Field naming the verifier; only present once verified.
pub const FIELD_VERIFIED_BY: &str = "Verified By";

/// Recognition marker written into the description for each session kind.
pub fn marker(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Verification => "Please react to verify",
        SessionKind::Submission => "Your score submission was received",
        SessionKind::EventManagement => "Event management",
    }
}

/// Session kind announced by a description, if it carries a known marker.
pub fn kind_for_marker(description: &str) -> Option<SessionKind> {
    let description = description.trim();
    [
        SessionKind::Verification,
        SessionKind::Submission,
        SessionKind::EventManagement,
    ]
    .into_iter()
    .find(|kind| marker(*kind) == description)
}

/// Render a review item and its fields.
pub fn encode(item: &ReviewItem, fields: &DomainFields) -> RenderedState {
    let mut rendered = vec![
        RenderedField::new(FIELD_EVENT, &fields.context_name),
        RenderedField::new(FIELD_EVENT_ID, item.context_id()),
        RenderedField::new(FIELD_USER, &fields.display_name),
        RenderedField::new(FIELD_SUBMISSION_ID, item.subject_id()),
        RenderedField::new(FIELD_IGN, &fields.ign),
        RenderedField::new(FIELD_SCORE, fields.score.to_string()),
        RenderedField::new(FIELD_STATUS, fields.state.to_string()),
    ];
    if let Some(verified_by) = &fields.verified_by {
        rendered.push(RenderedField::new(FIELD_VERIFIED_BY, verified_by));
    }

    RenderedState {
        description: marker(*item.kind()).to_string(),
        image_url: fields.image_url.clone(),
        fields: rendered,
    }
}

/// Render the session behind a handle.
pub fn encode_handle(handle: &SessionHandle, fields: &DomainFields) -> RenderedState {
    encode(handle.item(), fields)
}

/// Rebuild the session an artifact renders.
///
/// # Errors
///
/// `MalformedArtifact` when the description carries no known marker or a field holds
/// something unparsable, `MissingField` when a required field is absent.
pub fn decode(
    identity: &ArtifactIdentity,
    rendering: &RenderedState,
) -> CodecResult<(SessionHandle, DomainFields)> {
    let kind = kind_for_marker(&rendering.description).ok_or_else(|| {
        CodecError::new(CodecErrorKind::MalformedArtifact(format!(
            "unrecognised description '{}'",
            rendering.description
        )))
    })?;

    let context_id = required(rendering, FIELD_EVENT_ID)?;
    let subject_id = required(rendering, FIELD_SUBMISSION_ID)?;
    let score_text = required(rendering, FIELD_SCORE)?;
    let score = i64::from_str(score_text.trim()).map_err(|e| {
        CodecError::new(CodecErrorKind::MalformedArtifact(format!(
            "score '{}': {}",
            score_text, e
        )))
    })?;
    let verified_by = rendering.field(FIELD_VERIFIED_BY).map(str::to_string);

    // Renderings from before the status field existed only tell verified apart.
    let state = match rendering.field(FIELD_STATUS) {
        Some(status) => ReviewState::from_str(status.trim()).map_err(|_| {
            CodecError::new(CodecErrorKind::MalformedArtifact(format!(
                "status '{}'",
                status
            )))
        })?,
        None if verified_by.is_some() => ReviewState::Verified,
        None => ReviewState::UnderReview,
    };
    match (state == ReviewState::Verified, verified_by.is_some()) {
        (true, false) => {
            return Err(CodecError::new(CodecErrorKind::MissingField(
                FIELD_VERIFIED_BY.to_string(),
            )));
        }
        (false, true) => {
            return Err(CodecError::new(CodecErrorKind::MalformedArtifact(format!(
                "'{}' set on a submission that is {}",
                FIELD_VERIFIED_BY, state
            ))));
        }
        _ => {}
    }

    let fields = DomainFields {
        context_name: required(rendering, FIELD_EVENT)?.to_string(),
        display_name: required(rendering, FIELD_USER)?.to_string(),
        ign: required(rendering, FIELD_IGN)?.to_string(),
        score,
        image_url: rendering.image_url.clone(),
        state,
        verified_by,
    };
    let handle = SessionHandle::new(
        identity.clone(),
        ReviewItem::new(kind, subject_id, context_id),
    );
    Ok((handle, fields))
}

fn required<'a>(rendering: &'a RenderedState, name: &str) -> CodecResult<&'a str> {
    rendering
        .field(name)
        .ok_or_else(|| CodecError::new(CodecErrorKind::MissingField(name.to_string())))
}

/// Display-only fields appended to a rejected rendering, telling the submitter how to
/// fix their score.
pub fn instructions(subject_id: &str) -> Vec<RenderedField> {
    vec![
        RenderedField::new(
            "Instruction",
            "Please use the update command to give the submission a new score or remove this entry",
        ),
        RenderedField::new(
            "Template",
            format!(
                "```\n/events update-score submission-id: {} new-score: <new score>\n```",
                subject_id
            ),
        ),
    ]
}
