//! Free-form `--<tag>` flags on the `import` command line.
//!
//! clap only knows the flags it declares, so tag flags are pulled out of argv
//! before parsing. Anything the `import` subcommand declares itself (except
//! `--tag`) is left for clap.

use std::ffi::OsString;

use clap::Command;

pub const IMPORT_COMMAND: &str = "import";
const TAG_OPTION: &str = "tag";

/// Split `argv` into the arguments clap should see and the tags found on an
/// `import` command line, in order of appearance.
pub fn split_tag_flags(argv: Vec<OsString>, cli: &Command) -> (Vec<OsString>, Vec<String>) {
    let Some(sub_pos) = argv
        .iter()
        .skip(1)
        .position(|a| !a.to_string_lossy().starts_with('-'))
        .map(|p| p + 1)
    else {
        return (argv, Vec::new());
    };
    if argv[sub_pos] != IMPORT_COMMAND {
        return (argv, Vec::new());
    }
    let Some(import) = cli.find_subcommand(IMPORT_COMMAND) else {
        return (argv, Vec::new());
    };

    let mut kept: Vec<OsString> = argv[..=sub_pos].to_vec();
    let mut tags = Vec::new();
    let mut rest = argv[sub_pos + 1..].iter();

    while let Some(arg) = rest.next() {
        let text = arg.to_string_lossy();
        if text == "--" {
            kept.push(arg.clone());
            kept.extend(rest.cloned());
            break;
        }
        let Some(flag) = text.strip_prefix("--") else {
            kept.push(arg.clone());
            continue;
        };

        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };

        if name == TAG_OPTION {
            let value = match inline_value {
                Some(value) => Some(value.to_string()),
                None => rest.next().map(|v| v.to_string_lossy().to_string()),
            };
            tags.extend(value.filter(|v| !v.is_empty()));
            continue;
        }

        match declared_option(import, name) {
            Some(takes_value) => {
                kept.push(arg.clone());
                if takes_value && inline_value.is_none() {
                    if let Some(value) = rest.next() {
                        kept.push(value.clone());
                    }
                }
            }
            None => tags.push(name.to_string()),
        }
    }

    (kept, tags)
}

/// `Some(takes_value)` when `--name` is declared on `cmd`.
fn declared_option(cmd: &Command, name: &str) -> Option<bool> {
    if name == "help" {
        return Some(false);
    }
    cmd.get_arguments()
        .find(|arg| {
            arg.get_long() == Some(name)
                || arg
                    .get_all_aliases()
                    .map(|aliases| aliases.contains(&name))
                    .unwrap_or(false)
        })
        .map(|arg| arg.get_action().takes_values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use crate::Cli;

    fn split(args: &[&str]) -> (Vec<String>, Vec<String>) {
        let argv = args.iter().map(OsString::from).collect();
        let (kept, tags) = split_tag_flags(argv, &Cli::command());
        (
            kept.into_iter().map(|a| a.to_string_lossy().to_string()).collect(),
            tags,
        )
    }

    #[test]
    fn collects_unknown_flags_as_tags() {
        let (kept, tags) = split(&[
            "livegallery", "import", "a.HEIC", "--nature", "b.HEIC", "--premium",
        ]);
        assert_eq!(kept, ["livegallery", "import", "a.HEIC", "b.HEIC"]);
        assert_eq!(tags, ["nature", "premium"]);
    }

    #[test]
    fn keeps_declared_options_and_their_values() {
        let (kept, tags) = split(&[
            "livegallery", "import", "--gallery-root", "/g", "--labubu", "x.heic",
            "--output-dir=/h", "--tag", "scenic",
        ]);
        assert_eq!(
            kept,
            ["livegallery", "import", "--gallery-root", "/g", "x.heic", "--output-dir=/h"]
        );
        assert_eq!(tags, ["labubu", "scenic"]);
    }

    #[test]
    fn stops_at_double_dash() {
        let (kept, tags) = split(&["livegallery", "import", "--nature", "--", "--weird.heic"]);
        assert_eq!(kept, ["livegallery", "import", "--", "--weird.heic"]);
        assert_eq!(tags, ["nature"]);
    }

    #[test]
    fn other_commands_are_untouched() {
        let (kept, tags) = split(&["livegallery", "add", "ocean", "Ocean", "--premium"]);
        assert_eq!(kept, ["livegallery", "add", "ocean", "Ocean", "--premium"]);
        assert!(tags.is_empty());
    }
}
