#![allow(clippy::doc_overindented_list_items)]

mod constants;
mod error;
mod pssh;
mod reader;
mod types;

pub mod utils;

pub use self::constants::{
    CLEARKEY_SYSTEM_ID, FAIRPLAY_SYSTEM_ID, KID_LEN, PLAYREADY_SYSTEM_ID, WIDEVINE_SYSTEM_ID,
};
pub use self::error::{ContentKeyError, ParseError, PsshError};
pub use self::pssh::{PsshBox, PsshBoxes, pssh_boxes};
pub use self::reader::{ReadError, Reader};
pub use self::types::{ContentKey, Kid, SystemId};
pub use self::utils::{ParseKid, eq_ignore_ascii_case, parse_kid, trim_ascii};
