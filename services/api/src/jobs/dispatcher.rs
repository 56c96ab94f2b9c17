//! Side-effect dispatch through the domain ports.

use marquee_domain::{ExportArtifacts, JobSubmitter, StoreError, TaskKind, EXPORT_TASKS};
use marquee_id::{EventId, TaskId};

use super::SideEffect;

/// A task accepted by the job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedJob {
    pub task: TaskId,
    pub kind: TaskKind,
    pub event_id: EventId,
}

/// Submits planned side effects.
pub struct Dispatcher<'a> {
    jobs: &'a dyn JobSubmitter,
    exports: &'a dyn ExportArtifacts,
}

impl<'a> Dispatcher<'a> {
    pub fn new(jobs: &'a dyn JobSubmitter, exports: &'a dyn ExportArtifacts) -> Self {
        Self { jobs, exports }
    }

    /// Dispatch side effects in order, returning the submitted tasks.
    ///
    /// Export submissions are recorded as export jobs one by one, so a
    /// partial failure leaves earlier tasks trackable.
    pub async fn dispatch(&self, effects: &[SideEffect]) -> Result<Vec<SubmittedJob>, StoreError> {
        let mut submitted = Vec::new();

        for effect in effects {
            match effect {
                SideEffect::SubmitExports(event_id) => {
                    for kind in EXPORT_TASKS {
                        let task = self
                            .jobs
                            .submit(kind, *event_id, serde_json::json!({ "temp": false }))
                            .await?;
                        self.exports.record_job(task, *event_id).await?;
                        submitted.push(SubmittedJob {
                            task,
                            kind,
                            event_id: *event_id,
                        });
                    }
                }
                SideEffect::ClearExportArtifacts(event_id) => {
                    self.exports.clear_urls(*event_id).await?;
                }
                SideEffect::ResizeImages {
                    event_id,
                    original_image_url,
                } => {
                    let task = self
                        .jobs
                        .submit(
                            TaskKind::ResizeEventImages,
                            *event_id,
                            serde_json::json!({ "original_image_url": original_image_url }),
                        )
                        .await?;
                    submitted.push(SubmittedJob {
                        task,
                        kind: TaskKind::ResizeEventImages,
                        event_id: *event_id,
                    });
                }
            }
        }

        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_testing::{InMemoryArtifacts, RecordingJobQueue};

    #[tokio::test]
    async fn exports_submit_in_fixed_order_and_record_jobs() {
        let queue = RecordingJobQueue::new();
        let artifacts = InMemoryArtifacts::new();
        let dispatcher = Dispatcher::new(&queue, &artifacts);

        let event_id = EventId::new();
        let submitted = dispatcher
            .dispatch(&[SideEffect::SubmitExports(event_id)])
            .await
            .unwrap();

        let kinds: Vec<TaskKind> = submitted.iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::ExportXcal,
                TaskKind::ExportIcal,
                TaskKind::ExportPentabarf,
            ]
        );

        let submissions = queue.submissions();
        assert_eq!(submissions.len(), 3);
        for (_, submitted_event, args) in &submissions {
            assert_eq!(*submitted_event, event_id);
            assert_eq!(args, &serde_json::json!({ "temp": false }));
        }

        // One export job row per task.
        assert_eq!(artifacts.recorded_jobs().len(), 3);
        assert!(artifacts.cleared_events().is_empty());
    }

    #[tokio::test]
    async fn clearing_artifacts_submits_no_tasks() {
        let queue = RecordingJobQueue::new();
        let artifacts = InMemoryArtifacts::new();
        let dispatcher = Dispatcher::new(&queue, &artifacts);

        let event_id = EventId::new();
        let submitted = dispatcher
            .dispatch(&[SideEffect::ClearExportArtifacts(event_id)])
            .await
            .unwrap();

        assert!(submitted.is_empty());
        assert!(queue.submissions().is_empty());
        assert_eq!(artifacts.cleared_events(), vec![event_id]);
    }

    #[tokio::test]
    async fn resize_carries_the_source_url() {
        let queue = RecordingJobQueue::new();
        let artifacts = InMemoryArtifacts::new();
        let dispatcher = Dispatcher::new(&queue, &artifacts);

        let event_id = EventId::new();
        dispatcher
            .dispatch(&[SideEffect::ResizeImages {
                event_id,
                original_image_url: "https://cdn.example.org/banner.png".to_string(),
            }])
            .await
            .unwrap();

        let submissions = queue.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].0, TaskKind::ResizeEventImages);
        assert_eq!(
            submissions[0].2,
            serde_json::json!({ "original_image_url": "https://cdn.example.org/banner.png" })
        );
    }
}
