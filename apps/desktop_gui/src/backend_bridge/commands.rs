//! Backend commands queued from UI to backend worker.

use client_core::UploadCommand;
use shared::domain::DashboardSnapshot;

pub enum BackendCommand {
    Upload(UploadCommand),
    LoadSnapshot,
    SaveSnapshot(DashboardSnapshot),
    ClearSnapshot,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload(command) => command.name(),
            Self::LoadSnapshot => "load_snapshot",
            Self::SaveSnapshot(_) => "save_snapshot",
            Self::ClearSnapshot => "clear_snapshot",
        }
    }
}
