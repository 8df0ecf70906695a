pub mod board;
pub mod cycle;
pub mod entry;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod lanes;
pub mod metadata;
pub mod persistence;
pub mod resource;
pub mod timeline;

pub use board::{BoardError, NewEntry, OptimizeSummary, PasteSummary, RotationBoard};
pub use cycle::{DecodedTime, TimeCycle, decode_time, encode_time};
pub use entry::{EntryError, EntryRecord, ScheduleEntry};
pub use lanes::{AssignedEntry, LaneAssignment, LaneError, assign_lanes, peak_overlap};
pub use metadata::BoardMetadata;
pub use persistence::{
    ImportReport, PasteError, PersistenceError, load_board_from_csv, load_board_from_json,
    read_entries_csv, save_board_to_csv, save_board_to_json,
};
pub use resource::{LaneRoster, natural_cmp};
pub use timeline::TimelineView;
