//! Regenerate `src/scripts.rs` from the `--help` of every check
//!
//! Run from the repository root after `cargo build`:
//!
//! ```plain
//! $ cargo run -p make-docs > src/scripts.rs
//! ```

use std::env;
use std::process::{self, Command};

struct Check {
    name: &'static str,
    about: &'static str,
}

const CHECKS: &[Check] = &[Check {
    name: "check-elk-message",
    about: "Cross platform, only requires access to an Elasticsearch instance.",
}];

fn main() {
    let bin_dir = env::var("CHECK_BIN_DIR").unwrap_or_else(|_| "target/debug".to_owned());
    match render(&bin_dir) {
        Ok(docs) => print!("{}", docs),
        Err(e) => {
            eprintln!("make-docs: {}", e);
            process::exit(1);
        }
    }
}

fn render(bin_dir: &str) -> Result<String, String> {
    let mut out = comment(
        ["Documentation about the checks contained herein", ""]
            .iter()
            .copied(),
    );
    out.push('\n');
    out.push_str(&comment(
        CHECKS.iter().map(|c| format!("- [{0}](#{0})", c.name)),
    ));
    out.push('\n');

    for check in CHECKS {
        out.push_str(&format!(
            "//!\n//! # {0}\n//!\n//! {1}\n//!\n//! ```plain\n//! $ {0} --help\n",
            check.name, check.about
        ));
        out.push_str(&comment(help_text(bin_dir, check.name)?.lines()));
        out.push_str("\n//! ```\n");
    }
    Ok(out)
}

fn help_text(bin_dir: &str, name: &str) -> Result<String, String> {
    let path = format!("{}/{}", bin_dir, name);
    let output = Command::new(&path)
        .arg("--help")
        .output()
        .map_err(|e| format!("couldn't run {}: {}", path, e))?;
    String::from_utf8(output.stdout).map_err(|e| format!("{} --help is not utf8: {}", name, e))
}

/// Doc-comment each line, without trailing whitespace
fn comment<S: AsRef<str>, I: Iterator<Item = S>>(lines: I) -> String {
    lines
        .map(|line| format!("//! {}", line.as_ref()).trim_end().to_owned())
        .collect::<Vec<String>>()
        .join("\n")
}
