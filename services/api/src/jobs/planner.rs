//! Side-effect planning for event writes.

use marquee_domain::{Event, EventPatch};
use marquee_id::EventId;

/// A background side effect of an event write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Submit the full set of schedule export tasks.
    SubmitExports(EventId),
    /// Clear the event's published export URLs.
    ClearExportArtifacts(EventId),
    /// Resize the event's header image from this source URL.
    ResizeImages {
        event_id: EventId,
        original_image_url: String,
    },
}

/// Plan the side effects of a successful create.
pub fn plan_create(event: &Event) -> Vec<SideEffect> {
    let mut effects = Vec::new();

    if event.is_published() && event.schedule_published_on.is_some() {
        effects.push(SideEffect::SubmitExports(event.id));
    }

    if let Some(url) = &event.original_image_url {
        if !url.is_empty() {
            effects.push(SideEffect::ResizeImages {
                event_id: event.id,
                original_image_url: url.clone(),
            });
        }
    }

    effects
}

/// Plan the side effects of a successful update.
///
/// Exports are kept in lockstep with the publication flags: a published
/// event with a publication timestamp gets fresh exports, anything else has
/// its stale export URLs cleared.
pub fn plan_update(before: &Event, after: &Event, patch: &EventPatch) -> Vec<SideEffect> {
    let mut effects = Vec::new();

    if after.is_published() && after.schedule_published_on.is_some() {
        effects.push(SideEffect::SubmitExports(after.id));
    } else {
        effects.push(SideEffect::ClearExportArtifacts(after.id));
    }

    if let Some(Some(url)) = &patch.original_image_url {
        if !url.is_empty() && before.original_image_url.as_deref() != Some(url.as_str()) {
            effects.push(SideEffect::ResizeImages {
                event_id: after.id,
                original_image_url: url.clone(),
            });
        }
    }

    effects
}
