//! Background task kinds.

use serde::{Deserialize, Serialize};

/// Kinds of background tasks the engine submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ExportXcal,
    ExportIcal,
    ExportPentabarf,
    ResizeEventImages,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ExportXcal => "export_xcal",
            TaskKind::ExportIcal => "export_ical",
            TaskKind::ExportPentabarf => "export_pentabarf",
            TaskKind::ResizeEventImages => "resize_event_images",
        }
    }
}

/// Schedule-export tasks, in submission order.
pub const EXPORT_TASKS: [TaskKind; 3] = [
    TaskKind::ExportXcal,
    TaskKind::ExportIcal,
    TaskKind::ExportPentabarf,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_tasks_in_submission_order() {
        assert_eq!(
            EXPORT_TASKS,
            [
                TaskKind::ExportXcal,
                TaskKind::ExportIcal,
                TaskKind::ExportPentabarf,
            ]
        );
    }

    #[test]
    fn task_kind_serializes_snake_case() {
        let json = serde_json::to_string(&TaskKind::ResizeEventImages).unwrap();
        assert_eq!(json, r#""resize_event_images""#);
        assert_eq!(TaskKind::ExportIcal.as_str(), "export_ical");
    }
}
