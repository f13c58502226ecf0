//! `key=value` job options.
//!
//! Recognised keys: `inputFiles` (comma-separated, repeatable), `outputFile`,
//! `maxEvents` (`-1` = all) and `skipEvents`. Further integer options must be
//! registered with [`JobOptions::register_int`] before parsing.

use std::collections::BTreeMap;

use hc_core::{Error, Result};

/// Options for the job source and output, with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOptions {
    /// Input file names.
    pub input_files: Vec<String>,
    /// Output file name.
    pub output_file: String,
    /// Maximum number of events (`-1` = all).
    pub max_events: i64,
    /// Number of events skipped at the start of the input.
    pub skip_events: u32,
    extras: BTreeMap<String, i64>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            input_files: Vec::new(),
            output_file: String::new(),
            max_events: -1,
            skip_events: 0,
            extras: BTreeMap::new(),
        }
    }
}

impl JobOptions {
    /// Options with built-in defaults and no registered extras.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra integer option with its default value.
    pub fn register_int(mut self, name: impl Into<String>, default: i64) -> Self {
        self.extras.insert(name.into(), default);
        self
    }

    /// Current value of a registered integer option.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.extras.get(name).copied()
    }

    /// Apply `key=value` arguments on top of the current values.
    ///
    /// The first `inputFiles` argument replaces the defaults; later ones append.
    /// On error `self` is left unchanged.
    pub fn parse_arguments<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = self.clone();
        let mut inputs_replaced = false;
        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| Error::InvalidOption(format!("expected key=value, got '{arg}'")))?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "inputFiles" => {
                    if !inputs_replaced {
                        next.input_files.clear();
                        inputs_replaced = true;
                    }
                    next.input_files.extend(
                        value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from),
                    );
                }
                "outputFile" => next.output_file = value.to_string(),
                "maxEvents" => {
                    let n = parse_int(key, value)?;
                    if n < -1 {
                        return Err(Error::InvalidOption(format!(
                            "maxEvents must be -1 or non-negative, got {n}"
                        )));
                    }
                    next.max_events = n;
                }
                "skipEvents" => {
                    next.skip_events = value.parse().map_err(|_| {
                        Error::InvalidOption(format!(
                            "skipEvents expects a non-negative integer, got '{value}'"
                        ))
                    })?;
                }
                other => match next.extras.get_mut(other) {
                    Some(slot) => *slot = parse_int(other, value)?,
                    None => return Err(Error::InvalidOption(format!("unknown option '{other}'"))),
                },
            }
            tracing::debug!(key, value, "job option");
        }
        *self = next;
        Ok(())
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| Error::InvalidOption(format!("{key} expects an integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = JobOptions::new();
        assert!(o.input_files.is_empty());
        assert_eq!(o.max_events, -1);
        assert_eq!(o.skip_events, 0);
    }

    #[test]
    fn first_input_replaces_later_append() {
        let mut o = JobOptions::new();
        o.input_files = vec!["file:output.root".into()];
        o.parse_arguments(["inputFiles=a.root,b.root", "inputFiles=c.root"]).unwrap();
        assert_eq!(o.input_files, vec!["a.root", "b.root", "c.root"]);
    }

    #[test]
    fn scalar_options() {
        let mut o = JobOptions::new().register_int("ewkSkim", 1);
        o.parse_arguments(["maxEvents=100", "skipEvents=5", "outputFile=out.root", "ewkSkim=0"])
            .unwrap();
        assert_eq!(o.max_events, 100);
        assert_eq!(o.skip_events, 5);
        assert_eq!(o.output_file, "out.root");
        assert_eq!(o.get_int("ewkSkim"), Some(0));
    }

    #[test]
    fn rejects_malformed_and_unknown() {
        let mut o = JobOptions::new();
        assert!(matches!(o.parse_arguments(["maxEvents"]), Err(Error::InvalidOption(_))));
        assert!(matches!(o.parse_arguments(["ewkSkim=1"]), Err(Error::InvalidOption(_))));
        assert!(matches!(o.parse_arguments(["maxEvents=-2"]), Err(Error::InvalidOption(_))));
        assert!(matches!(o.parse_arguments(["skipEvents=-1"]), Err(Error::InvalidOption(_))));
        assert!(matches!(o.parse_arguments(["maxEvents=ten"]), Err(Error::InvalidOption(_))));
    }

    #[test]
    fn failed_parse_leaves_options_unchanged() {
        let mut o = JobOptions::new().register_int("ewkSkim", 1);
        o.input_files = vec!["file:output.root".into()];
        let before = o.clone();
        let res = o.parse_arguments(["inputFiles=a.root", "ewkSkim=0", "bogus=1"]);
        assert!(matches!(res, Err(Error::InvalidOption(_))));
        assert_eq!(o, before);
    }
}
