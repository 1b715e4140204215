use ledatronic_frame::START_MARKER;
use ledatronic_schema::decode;

use crate::cmd::{Context, DecodeArgs};
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::print_snapshot;

pub fn run(args: DecodeArgs, ctx: &Context) -> CliResult<i32> {
    let schema = ctx.load_schema()?;
    let payload = parse_payload(&args.hex, schema.required_len())?;

    if payload.len() < schema.required_len() {
        tracing::warn!(
            len = payload.len(),
            required = schema.required_len(),
            "payload shorter than schema"
        );
    }

    let snapshot = decode(&payload, &schema);
    print_snapshot(&snapshot, &schema, ctx.format);
    Ok(SUCCESS)
}

/// Parse hex input, dropping a leading start marker when the rest still
/// covers the schema.
fn parse_payload(input: &str, required_len: usize) -> CliResult<Vec<u8>> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    let bytes = hex::decode(&cleaned)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex payload: {err}")))?;

    if bytes.starts_with(&START_MARKER) && bytes.len() >= required_len + START_MARKER.len() {
        return Ok(bytes[START_MARKER.len()..].to_vec());
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_separators() {
        assert_eq!(parse_payload("00 1f:07", 3).unwrap(), vec![0x00, 0x1F, 0x07]);
    }

    #[test]
    fn strips_marker_only_when_payload_remains_complete() {
        assert_eq!(parse_payload("0e ff 01 02", 2).unwrap(), vec![0x01, 0x02]);
        // Without the marker the payload would be too short: keep the bytes.
        assert_eq!(
            parse_payload("0e ff 01", 2).unwrap(),
            vec![0x0E, 0xFF, 0x01]
        );
    }

    #[test]
    fn rejects_invalid_hex() {
        let err = parse_payload("zz", 1).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
