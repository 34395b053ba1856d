pub mod backend;
pub mod charts;
pub mod clock;
pub mod dashboard;
pub mod downloads;
pub mod error;
pub mod fixtures;
pub mod reports;
pub mod reveal;
pub mod timeline;
pub mod uploads;

pub use backend::{BackendError, FileBackend, FileUpload, HttpFileBackend, MissingFileBackend};
pub use charts::{ChartBoard, ChartCanvas, ChartSlot, ChartSpec, OwnedCharts};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dashboard::DashboardController;
pub use downloads::{AssetSaver, FileSaver};
pub use error::{ConsoleError, ErrorKind};
pub use reports::{ReportFilter, ReportRecord, ReportsController};
pub use reveal::{RevealController, RevealPhase, RevealStage};
pub use uploads::{
    execute, CandidateFile, EventSink, Notice, NoticeLevel, UploadCommand, UploadEvent,
    UploadManager, UploadPolicy, UploadRecord,
};
