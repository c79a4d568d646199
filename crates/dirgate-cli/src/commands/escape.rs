//! escape command - show how a value is escaped

use super::CommandContext;
use anyhow::Result;
use dirgate_auth::{escape, EscapeFlags};

pub fn execute(
    ctx: &CommandContext,
    value: &str,
    filter: bool,
    dn: bool,
    ignore: &str,
) -> Result<()> {
    let escaped = escape(value, ignore, flags(filter, dn));

    if ctx.is_json() {
        println!("{}", serde_json::json!({ "value": value, "escaped": escaped }));
    } else {
        println!("{}", escaped);
    }

    Ok(())
}

fn flags(filter: bool, dn: bool) -> EscapeFlags {
    let mut flags = EscapeFlags::NONE;
    if filter {
        flags = flags | EscapeFlags::FILTER;
    }
    if dn {
        flags = flags | EscapeFlags::DN;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_selection() {
        assert!(flags(false, false).is_empty());
        assert_eq!(flags(true, false), EscapeFlags::FILTER);
        assert_eq!(flags(false, true), EscapeFlags::DN);
        assert_eq!(flags(true, true), EscapeFlags::FILTER | EscapeFlags::DN);
    }
}
