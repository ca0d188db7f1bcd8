use std::ffi::OsString;

use elk_plugins::threshold::Threshold;
use elk_plugins::Status;
use structopt::clap::{AppSettings, ErrorKind};
use structopt::StructOpt;
use url::Url;

/// Search Elasticsearch for recent log lines from a host.
///
/// Counts the documents from <hostname> that contain <message> since <from>
/// and goes critical if that count violates the --critical threshold.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check-elk-message (part of elk-plugins)",
    after_help = "About Thresholds:

    --critical accepts either a comparison or a Nagios range:

        - `>0`, `>= 5`, `< 1`, `== 0`, `!= 0`: critical when the number of
          matches satisfies the comparison
        - `N` (0:N), `N:`, `~:N`, `A:B`: critical when the number of matches
          is outside the range
        - `@A:B`: critical when the number of matches is inside the range

    Without --critical the check is always OK.

Examples:

    Go critical if any OOM was logged by web-1 in the last hour:

        check-elk-message --es http://127.0.0.1:9200/ --hostname web-1 \\
            --message 'Out of memory' --critical '>0'"
)]
pub(crate) struct Args {
    #[structopt(long = "es", help = "Elasticsearch URL: http://127.0.0.1:9200/")]
    pub es: String,
    #[structopt(long = "message", help = "Message to search for")]
    pub message: String,
    #[structopt(long = "from", default_value = "now-1h", help = "time to search from")]
    pub from: String,
    #[structopt(long = "hostname", help = "Hostname to search against")]
    pub hostname: String,
    #[structopt(long = "username", default_value = "", help = "Username for basic auth")]
    pub username: String,
    #[structopt(
        long = "password",
        default_value = "",
        env = "CHECK_ELK_PASSWORD",
        hide_env_values = true,
        help = "Password for basic auth"
    )]
    pub password: String,
    #[structopt(
        long = "index",
        default_value = "filebeat-*",
        help = "Name of the index to query in elasticsearch"
    )]
    pub index: String,
    #[structopt(
        long = "item-type",
        default_value = "log",
        help = "Name of the item type to query in elasticsearch. Pass an empty \
                string for servers without mapping types."
    )]
    pub item_type: String,
    #[structopt(
        long = "field-timestamp",
        default_value = "@timestamp",
        help = "Name of the timestamp field to query"
    )]
    pub field_timestamp: String,
    #[structopt(
        long = "field-hostname",
        default_value = "beat.hostname",
        help = "Name of the hostname field to query"
    )]
    pub field_hostname: String,
    #[structopt(
        long = "field-message",
        default_value = "message",
        help = "Name of the message field to query"
    )]
    pub field_message: String,
    #[structopt(short = "c", long = "critical", help = "Threshold on the number of matches")]
    pub critical: Option<Threshold>,
    #[structopt(short = "v", long = "verbose", help = "Print the message of every matched document")]
    pub verbose: bool,
    #[structopt(long = "print-query", help = "Unconditionally print the query sent")]
    pub print_query: bool,
    #[structopt(
        long = "search-error",
        default_value = "unknown",
        possible_values = &Status::str_values(),
        help = "Status to exit with if Elasticsearch can't be queried"
    )]
    pub search_error: Status,
}

impl Args {
    /// Parse the process arguments, exiting UNKNOWN if they are unusable
    pub fn parse() -> Args {
        match Args::try_parse(std::env::args_os()) {
            Ok(args) => args,
            Err(msg) => Status::Unknown.exit_with(&msg),
        }
    }

    /// Parse and validate `argv`
    ///
    /// `--help` and `--version` still exit 0 through clap, every other
    /// problem comes back as the message to report.
    pub fn try_parse<I>(argv: I) -> Result<Args, String>
    where
        I: IntoIterator,
        I::Item: Into<OsString> + Clone,
    {
        // status lines are plain text
        let matches = Args::clap()
            .setting(AppSettings::ColorNever)
            .get_matches_from_safe(argv);
        let args = match matches {
            Ok(matches) => Args::from_clap(&matches),
            Err(e) => match e.kind {
                ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
                _ => return Err(summarize(&e.message)),
            },
        };
        args.validate()?;
        Ok(args)
    }

    fn validate(&self) -> Result<(), String> {
        let required = [
            ("es", &self.es),
            ("message", &self.message),
            ("from", &self.from),
            ("hostname", &self.hostname),
            ("index", &self.index),
            ("field-timestamp", &self.field_timestamp),
            ("field-hostname", &self.field_hostname),
            ("field-message", &self.field_message),
        ];
        for (name, value) in required.iter() {
            if value.trim().is_empty() {
                return Err(format!("Missing required option --{}", name));
            }
        }
        self.es_url()?;
        Ok(())
    }

    /// The backend URL; only http and https are accepted
    pub fn es_url(&self) -> Result<Url, String> {
        let url = Url::parse(self.es.trim())
            .map_err(|e| format!("Invalid --es url '{}': {}", self.es, e))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(format!(
                "Invalid --es url '{}': unsupported scheme '{}'",
                self.es, other
            )),
        }
    }

    /// Basic auth credentials, only if both halves were given
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if !self.username.is_empty() && !self.password.is_empty() {
            Some((&self.username, &self.password))
        } else {
            None
        }
    }
}

// clap errors end with a usage block that is noise in a status line
fn summarize(msg: &str) -> String {
    msg.lines()
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches("error: ")
        .to_owned()
}
