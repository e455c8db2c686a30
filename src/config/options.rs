// src/config/options.rs

//! Declared option schema.
//!
//! This is the "names, required-ness and defaults" contract a plugin host
//! reads for documentation and validation. The typed model in
//! [`super::model`] is what the runner itself uses.

/// One recognised option key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Dotted for nested asset fields, e.g. `assets.destination`.
    pub key: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

pub const FRIENDLY_NAME: &str = "OGC Runner Plugin";

pub const SUPPORTED_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        key: "name",
        required: false,
        default: None,
        description: "Name of the runner, used in logs and failure reports",
    },
    OptionSpec {
        key: "description",
        required: false,
        default: None,
        description: "Description of the running task",
    },
    OptionSpec {
        key: "command",
        required: false,
        default: None,
        description: "A shell command line to run",
    },
    OptionSpec {
        key: "script",
        required: false,
        default: None,
        description: "A blob of text to execute, must start with a shebang interpreter",
    },
    OptionSpec {
        key: "script_path",
        required: false,
        default: None,
        description: "Path to an existing script, run with `executable`",
    },
    OptionSpec {
        key: "executable",
        required: false,
        default: None,
        description: "Must be set when using `script_path`, the binary to run the script with (ie. python3)",
    },
    OptionSpec {
        key: "entry_point",
        required: false,
        default: None,
        description: "Single-element list naming the executable to launch",
    },
    OptionSpec {
        key: "args",
        required: false,
        default: None,
        description: "Arguments passed to `entry_point`, environment variables are expanded",
    },
    OptionSpec {
        key: "concurrent",
        required: false,
        default: Some("false"),
        description: "Run in the background and only wait for completion",
    },
    OptionSpec {
        key: "timeout",
        required: false,
        default: None,
        description: "Do not exceed this timeout in seconds, covers all retries",
    },
    OptionSpec {
        key: "retries",
        required: false,
        default: Some("0"),
        description: "Max number of retries",
    },
    OptionSpec {
        key: "wait_for_success",
        required: false,
        default: Some("false"),
        description: "Retry until the runner succeeds. Useful for status checks on a service that will eventually become ready",
    },
    OptionSpec {
        key: "back_off",
        required: false,
        default: None,
        description: "Time in seconds to wait between retries",
    },
    OptionSpec {
        key: "fail_silently",
        required: false,
        default: Some("false"),
        description: "Log a failed runner but do not halt the spec",
    },
    OptionSpec {
        key: "env_requires",
        required: false,
        default: None,
        description: "Environment variables that must be set before running",
    },
    OptionSpec {
        key: "assets",
        required: false,
        default: None,
        description: "Assets configuration",
    },
    OptionSpec {
        key: "assets.name",
        required: false,
        default: None,
        description: "Name of asset",
    },
    OptionSpec {
        key: "assets.source_file",
        required: false,
        default: None,
        description: "A file to move into place, (ie. a configuration file)",
    },
    OptionSpec {
        key: "assets.source_blob",
        required: false,
        default: None,
        description: "A text blob of a file to use",
    },
    OptionSpec {
        key: "assets.destination",
        required: false,
        default: None,
        description: "Where to output this asset, (ie. saving a pytest.ini blob to a tests directory)",
    },
    OptionSpec {
        key: "assets.is_executable",
        required: false,
        default: Some("false"),
        description: "Make this asset executable",
    },
];

pub fn find_option(key: &str) -> Option<&'static OptionSpec> {
    SUPPORTED_OPTIONS.iter().find(|opt| opt.key == key)
}

pub fn option_keys() -> impl Iterator<Item = &'static str> {
    SUPPORTED_OPTIONS.iter().map(|opt| opt.key)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn schema_matches_recognised_option_set() {
        let expected: BTreeSet<&str> = [
            "name",
            "description",
            "command",
            "script",
            "script_path",
            "executable",
            "entry_point",
            "args",
            "concurrent",
            "timeout",
            "retries",
            "wait_for_success",
            "back_off",
            "fail_silently",
            "env_requires",
            "assets",
            "assets.name",
            "assets.source_blob",
            "assets.source_file",
            "assets.destination",
            "assets.is_executable",
        ]
        .into_iter()
        .collect();

        let declared: BTreeSet<&str> = option_keys().collect();
        assert_eq!(declared, expected);
        assert_eq!(declared.len(), SUPPORTED_OPTIONS.len(), "duplicate keys");
    }

    #[test]
    fn boolean_options_default_to_false() {
        for key in ["concurrent", "wait_for_success", "fail_silently", "assets.is_executable"] {
            assert_eq!(find_option(key).and_then(|o| o.default), Some("false"), "{key}");
        }
        assert!(find_option("deps").is_none());
    }
}
