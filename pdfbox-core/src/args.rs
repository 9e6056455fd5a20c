//! Argument lists with slots for generated file paths
//!
//! Bridged calls need to put the path of a temp file somewhere in the
//! argument list before that file exists. Instead of magic strings, an
//! argument is either a literal or a typed slot. String arguments equal to
//! [`READER`] or [`WRITER`] convert to the matching slot, so
//! `["-sort", "{READER}", "{WRITER}"]` still works.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Placeholder replaced by the input temp file path
pub const READER: &str = "{READER}";

/// Placeholder replaced by the output temp file path
pub const WRITER: &str = "{WRITER}";

/// One element of a bridged argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Literal(OsString),
    /// Path of the temp file holding the caller's input
    Input,
    /// Path of the temp file the subcommand writes its result to
    Output,
}

impl Arg {
    /// A literal that is never interpreted as a slot
    pub fn literal(value: impl Into<OsString>) -> Self {
        Arg::Literal(value.into())
    }

    /// Convert a string token, recognizing the slot placeholders
    pub fn from_token(token: &str) -> Self {
        match token {
            READER => Arg::Input,
            WRITER => Arg::Output,
            other => Arg::Literal(other.into()),
        }
    }
}

impl From<&str> for Arg {
    fn from(token: &str) -> Self {
        Arg::from_token(token)
    }
}

impl From<String> for Arg {
    fn from(token: String) -> Self {
        match token.as_str() {
            READER => Arg::Input,
            WRITER => Arg::Output,
            _ => Arg::Literal(token.into()),
        }
    }
}

impl From<&Path> for Arg {
    fn from(path: &Path) -> Self {
        Arg::Literal(path.as_os_str().to_os_string())
    }
}

impl From<PathBuf> for Arg {
    fn from(path: PathBuf) -> Self {
        Arg::Literal(path.into_os_string())
    }
}

/// Which slots a bridged call can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotSet {
    InputOnly,
    InputAndOutput,
}

/// Check that `args` holds the slots `slots` needs and nothing it can't fill.
///
/// Returns a description of the problem on failure.
pub(crate) fn validate(args: &[Arg], slots: SlotSet) -> Result<(), String> {
    let has_input = args.iter().any(|a| *a == Arg::Input);
    let has_output = args.iter().any(|a| *a == Arg::Output);

    if !has_input {
        return Err(format!("missing {READER} slot"));
    }
    match slots {
        SlotSet::InputOnly if has_output => {
            Err(format!("{WRITER} slot given but no output is collected"))
        }
        SlotSet::InputAndOutput if !has_output => Err(format!("missing {WRITER} slot")),
        _ => Ok(()),
    }
}

/// Replace every slot with its path; each position holds at most one slot
pub(crate) fn resolve(args: &[Arg], input: &Path, output: Option<&Path>) -> Vec<OsString> {
    args.iter()
        .map(|arg| match arg {
            Arg::Literal(value) => value.clone(),
            Arg::Input => input.as_os_str().to_os_string(),
            Arg::Output => output
                .map(|p| p.as_os_str().to_os_string())
                .unwrap_or_else(|| OsString::from(WRITER)),
        })
        .collect()
}

/// Convert string tokens into an argument list
pub fn parse_tokens<I, S>(tokens: I) -> Vec<Arg>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().map(|t| Arg::from_token(t.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_become_slots() {
        let args = parse_tokens(["-sort", READER, WRITER]);
        assert_eq!(args, vec![Arg::literal("-sort"), Arg::Input, Arg::Output]);
        assert_eq!(Arg::from(String::from(READER)), Arg::Input);
    }

    #[test]
    fn test_literal_is_never_a_slot() {
        assert_eq!(Arg::literal(READER), Arg::Literal(READER.into()));
        assert_eq!(Arg::from("{READER} "), Arg::Literal("{READER} ".into()));
    }

    #[test]
    fn test_validate_input_only() {
        assert!(validate(&parse_tokens([READER]), SlotSet::InputOnly).is_ok());
        assert!(validate(&parse_tokens(["-i", "x"]), SlotSet::InputOnly).is_err());
        assert!(validate(&parse_tokens([READER, WRITER]), SlotSet::InputOnly).is_err());
    }

    #[test]
    fn test_validate_input_and_output() {
        assert!(validate(&parse_tokens([WRITER, READER]), SlotSet::InputAndOutput).is_ok());
        assert!(validate(&parse_tokens([READER]), SlotSet::InputAndOutput).is_err());
        assert!(validate(&parse_tokens([WRITER]), SlotSet::InputAndOutput).is_err());
        assert!(validate(&[], SlotSet::InputAndOutput).is_err());
    }

    #[test]
    fn test_resolve_keeps_positions() {
        let args = parse_tokens(["-password", "pw", READER, WRITER]);
        let resolved = resolve(&args, Path::new("/tmp/in.pdf"), Some(Path::new("/tmp/out.txt")));
        assert_eq!(
            resolved,
            vec![
                OsString::from("-password"),
                OsString::from("pw"),
                OsString::from("/tmp/in.pdf"),
                OsString::from("/tmp/out.txt"),
            ]
        );
    }

    #[test]
    fn test_resolve_fills_repeated_input_slot() {
        let args = vec![Arg::Input, Arg::literal("-o"), Arg::Input];
        let resolved = resolve(&args, Path::new("in"), None);
        assert_eq!(resolved, vec![OsString::from("in"), OsString::from("-o"), OsString::from("in")]);
    }
}
