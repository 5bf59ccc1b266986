//! Built-in commands.

use crate::RegistryError;
use serde_json::Value;
use vdom::MsgValue;

/// Uniform integer in the inclusive range `[from, to]`.
pub(crate) fn random(args: &Value) -> Result<MsgValue, RegistryError> {
    let from = int_arg(args, "from")?;
    let to = int_arg(args, "to")?;
    if to < from {
        return Err(RegistryError::BadArgs {
            entry: "random",
            detail: format!("empty range {from}..={to}"),
        });
    }
    let span = (to as i128 - from as i128 + 1) as u128;
    let offset = (random_u64()? as u128 % span) as i128;
    Ok(MsgValue::Integer {
        value: (from as i128 + offset) as i64,
    })
}

fn int_arg(args: &Value, name: &'static str) -> Result<i64, RegistryError> {
    args.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| RegistryError::BadArgs {
            entry: "random",
            detail: format!("missing integer `{name}`"),
        })
}

fn random_u64() -> Result<u64, RegistryError> {
    let mut buf = [0u8; 8];
    getrandom::fill(&mut buf).map_err(|e| RegistryError::BadArgs {
        entry: "random",
        detail: format!("entropy source failed: {e}"),
    })?;
    Ok(u64::from_le_bytes(buf))
}
