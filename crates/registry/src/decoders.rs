//! Built-in decoders.
//!
//! A decoder turns a raw occurrence into message data, or declines by
//! returning `None`. Extension occurrences arrive as positional args; the
//! built-ins read the first arg where that makes sense.

use crate::DecoderInput;
use serde_json::Value;
use vdom::MsgValue;

pub(crate) fn succeed(_args: &Value, _input: &DecoderInput<'_>) -> Option<MsgValue> {
    Some(MsgValue::Nothing)
}

pub(crate) fn target_value(_args: &Value, input: &DecoderInput<'_>) -> Option<MsgValue> {
    let value = match input {
        DecoderInput::Ui(event) => event.value.clone()?,
        DecoderInput::Native(args) => args.first()?.as_str()?.to_string(),
    };
    Some(MsgValue::String { value })
}

pub(crate) fn target_checked(_args: &Value, input: &DecoderInput<'_>) -> Option<MsgValue> {
    let value = match input {
        DecoderInput::Ui(event) => event.checked?,
        DecoderInput::Native(args) => args.first()?.as_bool()?,
    };
    Some(MsgValue::Boolean { value })
}

/// Key filter: produces a message only for the configured key code.
pub(crate) fn the_key_code(args: &Value, input: &DecoderInput<'_>) -> Option<MsgValue> {
    let want = args.get("keyCode")?.as_i64()?;
    let got = match input {
        DecoderInput::Ui(event) => event.key_code?,
        DecoderInput::Native(args) => args.first()?.as_i64()?,
    };
    (want == got).then_some(MsgValue::Nothing)
}
