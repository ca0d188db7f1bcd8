//! Check Elasticsearch for log messages from a host
//!
//! Runs one search for documents from `--hostname` containing `--message`
//! since `--from`, and compares the number of matches against `--critical`.

mod args;
mod elastic;
mod query;

use std::io::{self, Write};

use elk_plugins::threshold::Threshold;
use elk_plugins::{init_logging, Status};
use tracing::{debug, info, warn};

use crate::args::Args;
use crate::elastic::{Elastic, SearchBackend, SearchResult};
use crate::query::SearchQuery;

/// What the check decided, ready to be reported
#[derive(Debug, PartialEq)]
struct Outcome {
    status: Status,
    summary: String,
    /// Extra lines after the status line
    details: Option<String>,
}

impl Outcome {
    fn exit(self) -> ! {
        println!("{}", self.status.line(&self.summary));
        if let Some(details) = self.details {
            println!("{}", details);
        }
        self.status.exit()
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let query = SearchQuery::from_args(&args);
    let es = match args.es_url() {
        Ok(url) => Elastic::new(url, args.credentials()),
        Err(msg) => Status::Unknown.exit_with(&msg),
    };
    let es = es.unwrap_or_else(|e| args.search_error.exit_with(&e.short_display()));
    debug!(basic_auth = es.has_auth(), "elasticsearch client ready");

    if args.print_query {
        if let Ok(url) = es.search_url(&query) {
            println!("INFO: querying {}", url);
        }
        println!("INFO: query body: {}", query.body());
    }

    let stdout = io::stdout();
    let outcome = run_check(&args, &query, &es, &mut stdout.lock());
    outcome.exit();
}

/// Run the search and decide on a status
///
/// Verbose output goes to `out`. A failed search is never retried and skips
/// the threshold entirely.
fn run_check<B, W>(args: &Args, query: &SearchQuery, backend: &B, out: &mut W) -> Outcome
where
    B: SearchBackend,
    W: Write,
{
    let result = match backend.search(query) {
        Ok(result) => result,
        Err(e) => {
            let full = e.to_string();
            let summary = e.short_display();
            return Outcome {
                status: args.search_error,
                details: if full != summary { Some(full) } else { None },
                summary,
            };
        }
    };

    if args.verbose {
        if let Err(e) = report_messages(&result, out) {
            warn!(error = %e, "couldn't write verbose output");
        }
    }

    let total = result.total_hits();
    if result.hits.total.is_lower_bound() {
        warn!(total, "elasticsearch stopped counting, the real total is higher");
    }
    Outcome {
        status: evaluate(args.critical.as_ref(), total),
        summary: format!("Total matches: {}", total),
        details: None,
    }
}

/// Print the message of each returned document
///
/// Documents without a string `message` are logged and skipped. Returns how
/// many messages were printed.
fn report_messages<W: Write>(result: &SearchResult, out: &mut W) -> io::Result<usize> {
    let mut printed = 0;
    for hit in &result.hits.hits {
        match hit.message() {
            Ok(message) => {
                writeln!(out, "INFO: {}", message)?;
                printed += 1;
            }
            Err(e) => warn!("{}", e),
        }
    }
    Ok(printed)
}

/// Critical if the threshold is violated; with no threshold, always OK
fn evaluate(critical: Option<&Threshold>, total: u64) -> Status {
    let threshold = match critical {
        Some(threshold) => threshold,
        None => return Status::Ok,
    };
    let violated = threshold.evaluate(total as f64);
    info!(critical = %threshold, total, violated, "checked threshold");
    if violated {
        Status::Critical
    } else {
        Status::Ok
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use super::*;
    use crate::elastic::SearchError;

    struct FakeElastic {
        response: Option<Value>,
        calls: Cell<usize>,
    }

    impl FakeElastic {
        fn returning(response: Value) -> FakeElastic {
            FakeElastic {
                response: Some(response),
                calls: Cell::new(0),
            }
        }

        fn unavailable() -> FakeElastic {
            FakeElastic {
                response: None,
                calls: Cell::new(0),
            }
        }

        fn with_total(total: u64) -> FakeElastic {
            FakeElastic::returning(json!({"hits": {"total": total, "hits": []}}))
        }
    }

    impl SearchBackend for FakeElastic {
        fn search(&self, _query: &SearchQuery) -> Result<SearchResult, SearchError> {
            self.calls.set(self.calls.get() + 1);
            match self.response {
                Some(ref v) => Ok(serde_json::from_value(v.clone()).unwrap()),
                None => Err(SearchError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: "{\"error\":\"no shards\"}".to_owned(),
                }),
            }
        }
    }

    fn build_args(extra: &[&str]) -> Args {
        args::test::build_args(extra).unwrap()
    }

    fn check(args: &Args, backend: &FakeElastic) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = run_check(args, &SearchQuery::from_args(args), backend, &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn no_matches_is_ok() {
        let backend = FakeElastic::with_total(0);
        let (outcome, _) = check(&build_args(&["--critical", ">0"]), &backend);
        assert_eq!(
            outcome,
            Outcome {
                status: Status::Ok,
                summary: "Total matches: 0".into(),
                details: None,
            }
        );
        assert_eq!(outcome.status.code(), 0);
        assert_eq!(backend.calls.get(), 1);
    }

    #[test]
    fn matches_over_threshold_are_critical() {
        let (outcome, _) = check(&build_args(&["--critical", ">0"]), &FakeElastic::with_total(4));
        assert_eq!(outcome.status, Status::Critical);
        assert_eq!(outcome.summary, "Total matches: 4");
        assert_eq!(outcome.status.code(), 2);
    }

    #[test]
    fn nagios_range_thresholds() {
        let args = build_args(&["-c", "5"]);
        assert_eq!(check(&args, &FakeElastic::with_total(10)).0.status, Status::Critical);
        assert_eq!(check(&args, &FakeElastic::with_total(3)).0.status, Status::Ok);
    }

    #[test]
    fn without_a_threshold_the_check_is_ok() {
        let (outcome, _) = check(&build_args(&[]), &FakeElastic::with_total(1_000_000));
        assert_eq!(outcome.status, Status::Ok);
    }

    #[test]
    fn the_total_is_counted_not_the_page() {
        let hits: Vec<Value> = (0..100).map(|_| json!({"_source": {"message": "oom"}})).collect();
        let backend = FakeElastic::returning(json!({"hits": {"total": 150, "hits": hits}}));
        let (outcome, _) = check(&build_args(&["-c", "120:"]), &backend);
        assert_eq!(outcome.summary, "Total matches: 150");
        assert_eq!(outcome.status, Status::Ok);
    }

    #[test]
    fn verbose_skips_undecodable_documents() {
        let backend = FakeElastic::returning(json!({
            "hits": {
                "total": 2,
                "hits": [
                    {"_id": "1", "_source": {"msg": "no message field here"}},
                    {"_id": "2", "_source": {"message": "Out of memory: kill process 42"}}
                ]
            }
        }));
        let (outcome, out) = check(&build_args(&["-v", "-c", ">0"]), &backend);
        assert_eq!(out, "INFO: Out of memory: kill process 42\n");
        assert_eq!(outcome.status, Status::Critical);
        assert_eq!(outcome.summary, "Total matches: 2");
    }

    #[test]
    fn quiet_without_verbose() {
        let backend = FakeElastic::returning(json!({
            "hits": {"total": 1, "hits": [{"_source": {"message": "oom"}}]}
        }));
        let (_, out) = check(&build_args(&[]), &backend);
        assert_eq!(out, "");
    }

    #[test]
    fn search_failures_skip_the_threshold() {
        let backend = FakeElastic::unavailable();
        let (outcome, out) = check(&build_args(&["-v", "-c", ">0"]), &backend);
        assert_eq!(outcome.status, Status::Unknown);
        assert_eq!(outcome.summary, "Elasticsearch returned 503 Service Unavailable");
        assert!(outcome.details.unwrap().contains("no shards"));
        assert!(!outcome.summary.contains("Total matches"));
        assert_eq!(out, "");
        assert_eq!(backend.calls.get(), 1);
    }

    #[test]
    fn search_failure_status_is_configurable() {
        let args = build_args(&["--search-error", "critical"]);
        let (outcome, _) = check(&args, &FakeElastic::unavailable());
        assert_eq!(outcome.status, Status::Critical);
    }

    #[test]
    fn report_counts_printed_messages() {
        let result: SearchResult = serde_json::from_value(json!({
            "hits": {
                "total": 3,
                "hits": [
                    {"_source": {"message": "a"}},
                    {"_source": {"message": ["not", "a", "string"]}},
                    {"_source": {"message": "c"}}
                ]
            }
        }))
        .unwrap();
        let mut out = Vec::new();
        assert_eq!(report_messages(&result, &mut out).unwrap(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "INFO: a\nINFO: c\n");
    }

    #[test]
    fn evaluating_thresholds() {
        let over_five: Threshold = "> 5".parse().unwrap();
        assert_eq!(evaluate(Some(&over_five), 10), Status::Critical);
        assert_eq!(evaluate(Some(&over_five), 3), Status::Ok);
        assert_eq!(evaluate(None, 10), Status::Ok);
        assert_eq!(over_five.to_string(), "> 5");
    }
}
