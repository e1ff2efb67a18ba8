mod client;
mod siyuan;

pub use client::{
    DEFAULT_BASE_URL, DayNote, DinoxClient, DinoxError, FetchRequest, Note, SUCCESS_CODE,
};
pub use siyuan::{SiyuanClient, SiyuanError};
