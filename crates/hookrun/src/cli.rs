use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

/// Environment fallback for `--hook`.
pub const HOOK_ENV: &str = "SLACK_WEBHOOK_URL";

/// Flags that take a value, either `-flag value` or `-flag=value`.
const VALUE_FLAGS: &[&str] = &["hook", "channel", "username", "emoji", "icon", "config"];
/// Flags that never consume the next argument.
const SWITCH_FLAGS: &[&str] = &["timing", "verbose", "help", "version"];

/// hookrun – run a command and post its output to a Slack webhook
#[derive(Parser, Debug)]
#[command(name = "hookrun", author, version, about, long_about = None)]
pub struct Cli {
    /// Slack incoming webhook URL
    #[arg(long, value_name = "URL", env = HOOK_ENV, hide_env_values = true)]
    pub hook: Option<String>,

    /// Channel where to post the output
    #[arg(long)]
    pub channel: Option<String>,

    /// Username to post as
    #[arg(long)]
    pub username: Option<String>,

    /// Emoji to use as the icon
    #[arg(long)]
    pub emoji: Option<String>,

    /// URL of icon to use
    #[arg(long, value_name = "URL")]
    pub icon: Option<String>,

    /// Include command execution timing
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub timing: Option<bool>,

    /// Show command output on screen while it runs
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub verbose: Option<bool>,

    /// Sets a custom config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Command to run, followed by its arguments
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Rewrite single-dash long flags (`-hook URL`, `-timing`) to the `--hook`
/// form clap understands. Only the flag section is touched: scanning stops at
/// the first positional argument or `--`, so the command's own arguments
/// pass through unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let parsed = arg.to_str().filter(|a| is_flag(a)).map(classify);
        let Some((rewritten, takes_value)) = parsed else {
            out.push(arg);
            break;
        };
        out.push(rewritten.map_or(arg, OsString::from));
        if takes_value {
            if let Some(value) = args.next() {
                out.push(value);
            }
        }
    }

    out.extend(args);
    out
}

fn is_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg != "-" && arg != "--"
}

/// Returns the `--` spelling when `flag` is a known single-dash long flag,
/// and whether the following argument is its value.
fn classify(flag: &str) -> (Option<String>, bool) {
    let (body, single_dash) = match flag.strip_prefix("--") {
        Some(rest) => (rest, false),
        None => (&flag[1..], true),
    };
    let (name, inline_value) = match body.split_once('=') {
        Some((name, _)) => (name, true),
        None => (body, false),
    };

    let takes_value = VALUE_FLAGS.contains(&name);
    let known = takes_value || SWITCH_FLAGS.contains(&name);
    let rewritten = (single_dash && known).then(|| format!("--{body}"));
    (rewritten, takes_value && !inline_value)
}
