//! Documentation about the checks contained herein
//!
//! - [check-elk-message](#check-elk-message)
//!
//! # check-elk-message
//!
//! Cross platform, only requires access to an Elasticsearch instance.
//!
//! ```plain
//! $ check-elk-message --help
//! check-elk-message (part of elk-plugins) 0.1.0
//! Search Elasticsearch for recent log lines from a host.
//!
//! Counts the documents from <hostname> that contain <message> since <from> and goes critical if that count violates the
//! --critical threshold.
//!
//! USAGE:
//!     check-elk-message [FLAGS] [OPTIONS] --es <es> --hostname <hostname> --message <message>
//!
//! FLAGS:
//!     -h, --help           Prints help information
//!         --print-query    Unconditionally print the query sent
//!     -V, --version        Prints version information
//!     -v, --verbose        Print the message of every matched document
//!
//! OPTIONS:
//!     -c, --critical <critical>                  Threshold on the number of matches
//!         --es <es>                              Elasticsearch URL: http://127.0.0.1:9200/
//!         --field-hostname <field-hostname>      Name of the hostname field to query [default: beat.hostname]
//!         --field-message <field-message>        Name of the message field to query [default: message]
//!         --field-timestamp <field-timestamp>    Name of the timestamp field to query [default: @timestamp]
//!         --from <from>                          time to search from [default: now-1h]
//!         --hostname <hostname>                  Hostname to search against
//!         --index <index>                        Name of the index to query in elasticsearch [default: filebeat-*]
//!         --item-type <item-type>
//!             Name of the item type to query in elasticsearch. Pass an empty string for servers without mapping types.
//!             [default: log]
//!         --message <message>                    Message to search for
//!         --password <password>                  Password for basic auth [env: CHECK_ELK_PASSWORD]  [default: ]
//!         --search-error <search-error>
//!             Status to exit with if Elasticsearch can't be queried [default: unknown]  [possible values: ok, warning,
//!             critical, unknown]
//!         --username <username>                  Username for basic auth [default: ]
//!
//! About Thresholds:
//!
//!     --critical accepts either a comparison or a Nagios range:
//!
//!         - `>0`, `>= 5`, `< 1`, `== 0`, `!= 0`: critical when the number of
//!           matches satisfies the comparison
//!         - `N` (0:N), `N:`, `~:N`, `A:B`: critical when the number of matches
//!           is outside the range
//!         - `@A:B`: critical when the number of matches is inside the range
//!
//!     Without --critical the check is always OK.
//!
//! Examples:
//!
//!     Go critical if any OOM was logged by web-1 in the last hour:
//!
//!         check-elk-message --es http://127.0.0.1:9200/ --hostname web-1 \
//!             --message 'Out of memory' --critical '>0'
//! ```
