use crate::entry::EntryError;
use std::io;
use thiserror::Error;

pub use paste::PasteError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid paste payload: {0}")]
    Paste(#[from] PasteError),
}

impl From<EntryError> for PersistenceError {
    fn from(value: EntryError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub mod file;
pub mod paste;

pub use file::{
    ImportReport, load_board_from_csv, load_board_from_json, read_entries_csv,
    save_board_to_csv, save_board_to_json, write_board_csv,
};
pub use paste::{PasteRow, parse_iso_instant, parse_paste_payload, to_paste_payload};
