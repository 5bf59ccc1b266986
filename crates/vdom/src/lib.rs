mod edit;
mod msg;
mod types;
mod wire;

pub use crate::edit::{Edit, Patch};
pub use crate::msg::{Msg, MsgValue, make_message};
pub use crate::types::{Handle, Handler, VNode};
pub use crate::wire::{Cmd, DecodeError, ServerPayload, Sub, parse_payload};
