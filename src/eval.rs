//! Expression & Command Evaluator: parse one script line, decide
//! assignment vs. command, evaluate conditionals. See spec.md §4.4.

use http::HeaderMap;
use url::Url;

use crate::cookies::CookieJar;
use crate::error::{NiplError, ParseError, ResolveError};
use crate::http::{FetchRequest, HttpClient};
use crate::namespace::Namespace;

/// What a single executed line tells the dialect runner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    /// `report`: end this phase, re-query the processor.
    Report,
    /// `play`: terminate with success.
    Play,
}

enum LineKind<'a> {
    Assign { name: &'a str, value: &'a str },
    Command { name: &'a str, arg: &'a str },
}

/// Splits a line into an assignment or a command, per spec.md §6's
/// grammar: the first non-name character decides it (`=` -> assignment,
/// ` ` -> command). A line with no name at all is malformed.
fn classify_line(line: &str) -> Result<LineKind<'_>, ParseError> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] != b'=' && bytes[i] != b' ' {
        i += 1;
    }
    if i == 0 {
        return Err(ParseError::MalformedLine(line.to_string()));
    }
    let name = &line[..i];
    Ok(match bytes.get(i) {
        Some(b'=') => LineKind::Assign {
            name,
            value: &line[i + 1..],
        },
        Some(b' ') => LineKind::Command {
            name,
            arg: &line[i + 1..],
        },
        _ => LineKind::Command { name, arg: "" },
    })
}

/// Evaluates one executable line (assignment or command; control-flow
/// keywords are stripped out by the dialect runner before this is called).
pub(crate) async fn execute_line(
    line: &str,
    ns: &mut Namespace,
    http: &dyn HttpClient,
    jar: &mut CookieJar,
) -> Result<Signal, ResolveError> {
    match classify_line(line)? {
        LineKind::Assign { name, value } => {
            ns.set(name, value)?;
            Ok(Signal::Continue)
        }
        LineKind::Command { name, arg } => execute_command(name, arg, ns, http, jar).await,
    }
}

async fn execute_command(
    cmd: &str,
    arg: &str,
    ns: &mut Namespace,
    http: &dyn HttpClient,
    jar: &mut CookieJar,
) -> Result<Signal, ResolveError> {
    match cmd {
        "concat" => {
            do_concat(arg, ns)?;
            Ok(Signal::Continue)
        }
        "verbose" => {
            do_verbose(arg, ns)?;
            Ok(Signal::Continue)
        }
        "debug" => {
            if ns.verbose() > 0 {
                tracing::debug!(target: "nipl::script", "{arg}");
            }
            Ok(Signal::Continue)
        }
        "print" => {
            tracing::info!(target: "nipl::script", "{}", ns.expand(arg));
            Ok(Signal::Continue)
        }
        "error" => Err(NiplError::ScriptError(arg.to_string()).into()),
        "match" => {
            do_match_command(arg, ns)?;
            Ok(Signal::Continue)
        }
        "replace" => {
            do_replace(arg, ns)?;
            Ok(Signal::Continue)
        }
        "unescape" => {
            do_unescape(arg, ns);
            Ok(Signal::Continue)
        }
        "scrape" => {
            do_scrape(ns, http, jar).await?;
            Ok(Signal::Continue)
        }
        "report" => Ok(Signal::Report),
        "report_val" => {
            do_report_val(arg, ns)?;
            Ok(Signal::Continue)
        }
        "play" => Ok(Signal::Play),
        other => Err(NiplError::UnknownCommand(other.to_string()).into()),
    }
}

fn do_concat(arg: &str, ns: &mut Namespace) -> Result<(), NiplError> {
    let (var, value) = arg
        .split_once(' ')
        .ok_or_else(|| NiplError::ScriptError(format!("concat: missing argument in '{arg}'")))?;
    let appended = ns.get(var) + &ns.expand(value);
    ns.setvar(var, appended);
    Ok(())
}

fn do_verbose(arg: &str, ns: &mut Namespace) -> Result<(), NiplError> {
    let level: i32 = arg
        .trim()
        .parse()
        .map_err(|_| NiplError::InvalidVerbosity(arg.trim().to_string()))?;
    ns.set_verbose(level);
    Ok(())
}

/// `match V` — match only against the named variable, not an expanded
/// literal (spec.md §4.4).
fn do_match_command(arg: &str, ns: &mut Namespace) -> Result<(), NiplError> {
    let value = ns.get(arg.trim());
    let regex = ns.get("regex");
    if regex.is_empty() {
        return Err(NiplError::MissingRegex);
    }
    ns.do_match(&regex, &value)
}

fn do_replace(arg: &str, ns: &mut Namespace) -> Result<(), NiplError> {
    let (var, replacement_arg) = arg
        .split_once(' ')
        .ok_or_else(|| NiplError::ScriptError(format!("replace: missing argument in '{arg}'")))?;
    let replacement = ns.expand(replacement_arg);
    let regex = ns.get("regex");
    if regex.is_empty() {
        return Err(NiplError::MissingRegex);
    }
    let re = regex::Regex::new(&regex)?;
    let current = ns.get(var);
    let replaced = re.replace_all(&current, replacement.as_str()).into_owned();
    ns.setvar(var, replaced);
    Ok(())
}

fn do_unescape(arg: &str, ns: &mut Namespace) {
    let var = arg.trim();
    let current = ns.get(var);
    let decoded = percent_encoding::percent_decode_str(&current)
        .decode_utf8_lossy()
        .into_owned();
    ns.setvar(var, decoded);
}

fn do_report_val(arg: &str, ns: &mut Namespace) -> Result<(), NiplError> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| NiplError::ScriptError(format!("report_val: missing '=' in '{arg}'")))?;
    let value = ns.expand(value);
    ns.set_report_val(key.trim(), value);
    Ok(())
}

/// `scrape` — fetch the `s_*`-described request, populate `htmRaw`/`v1`
/// depending on `s_action`, and run the regex match if one is set.
/// See spec.md §4.1 and §4.4.
pub(crate) async fn do_scrape(
    ns: &mut Namespace,
    http: &dyn HttpClient,
    jar: &mut CookieJar,
) -> Result<(), NiplError> {
    let url = ns.get("s_url");
    if url.is_empty() {
        return Err(NiplError::MissingScrapeUrl);
    }
    let action = ns.action();

    let mut headers = HeaderMap::new();
    for (name, value) in ns.s_headers() {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }

    let mut cookie = String::new();
    if let Ok(parsed) = Url::parse(&url) {
        cookie = jar.header_for(&parsed);
    }
    let script_cookie = ns.get("s_cookie");
    if !script_cookie.is_empty() {
        if !cookie.is_empty() {
            cookie.push_str("; ");
        }
        cookie.push_str(&script_cookie);
    }

    let request = FetchRequest {
        method: ns.method(),
        action,
        agent: ns.get("s_agent"),
        referer: ns.get("s_referer"),
        cookie,
        postdata: ns.get("s_postdata"),
        headers,
    };

    let response = http
        .fetch(&url, &request)
        .await
        .map_err(|e| NiplError::ScriptError(e.to_string()))?;

    jar.absorb_all(&response.set_cookies);
    let received_cookies: Vec<(String, String)> = jar.as_pairs().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ns.set_received(response.headers.clone(), received_cookies);

    ns.setvar("geturl", response.location.clone().unwrap_or_default());

    match action {
        crate::http::Action::Read => {
            ns.setvar("htmRaw", response.content.clone());
            let regex = ns.get("regex");
            if !regex.is_empty() {
                ns.do_match(&regex, &response.content)?;
            }
        }
        crate::http::Action::Headers => {
            ns.setvar("htmRaw", String::new());
        }
        crate::http::Action::GetUrl => {
            ns.clear_captures();
            let location = response.location.unwrap_or_default();
            ns.setvar("v1", location.clone());
            ns.set_report_val("v1", location);
        }
    }
    Ok(())
}

/// The closed set of 8 comparison operators NIPL's `if` expressions
/// support; `=` is an alias for `==`, `<>` for `!=` (spec.md §9).
fn compare(op: &str, lhs: &str, rhs: &str) -> Result<bool, NiplError> {
    Ok(match op {
        "<" => lhs < rhs,
        "<=" => lhs <= rhs,
        ">" => lhs > rhs,
        ">=" => lhs >= rhs,
        "=" | "==" => lhs == rhs,
        "!=" | "<>" => lhs != rhs,
        other => return Err(NiplError::InvalidOperator(other.to_string())),
    })
}

/// Splits `LHS OP RHS`, scanning for the first run of `<>=!` characters,
/// mirroring the original interpreter's `RE_IFEXPR`.
fn split_comparison(expr: &str) -> Option<(&str, &str, &str)> {
    let bytes = expr.as_bytes();
    let is_op_char = |b: u8| matches!(b, b'<' | b'>' | b'=' | b'!');
    let op_start = bytes.iter().position(|&b| is_op_char(b))?;
    let mut op_end = op_start;
    while op_end < bytes.len() && is_op_char(bytes[op_end]) {
        op_end += 1;
    }
    let lhs = expr[..op_start].trim();
    let op = &expr[op_start..op_end];
    let rhs = expr[op_end..].trim();
    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }
    Some((lhs, op, rhs))
}

fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Evaluates a NIPL `if`/`elseif` expression to a boolean (spec.md §4.4).
pub(crate) fn eval_expr(expr: &str, ns: &Namespace) -> Result<bool, NiplError> {
    let expr = expr.trim();
    if let Some((lhs, op, rhs)) = split_comparison(expr) {
        let lval = ns.get(lhs);
        let rval = ns.expand(rhs);
        compare(op, &lval, &rval)
    } else {
        Ok(truthy(&ns.get(expr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nookies::InMemoryNookieStore;
    use std::sync::Arc;

    fn ns() -> Namespace {
        Namespace::new(
            "http://source.example/item",
            crate::http::DEFAULT_USER_AGENT,
            Arc::new(InMemoryNookieStore::new()),
        )
    }

    #[test]
    fn classifies_assignment_vs_command() {
        match classify_line("foo='bar").unwrap() {
            LineKind::Assign { name, value } => {
                assert_eq!(name, "foo");
                assert_eq!(value, "'bar");
            }
            _ => panic!("expected assignment"),
        }
        match classify_line("play").unwrap() {
            LineKind::Command { name, arg } => {
                assert_eq!(name, "play");
                assert_eq!(arg, "");
            }
            _ => panic!("expected command"),
        }
        match classify_line("print 'hello world").unwrap() {
            LineKind::Command { name, arg } => {
                assert_eq!(name, "print");
                assert_eq!(arg, "'hello world");
            }
            _ => panic!("expected command"),
        }
    }

    #[test]
    fn rejects_line_with_no_name() {
        assert!(classify_line("").is_err());
        assert!(classify_line(" rest").is_err());
    }

    #[test]
    fn expr_comparison_and_truthiness() {
        let mut n = ns();
        n.set("foo", "'bar").unwrap();
        assert!(eval_expr("foo = 'bar", &n).unwrap());
        assert!(!eval_expr("foo = 'baz", &n).unwrap());
        assert!(eval_expr("foo", &n).unwrap());
        n.set("flag", "'0").unwrap();
        assert!(!eval_expr("flag", &n).unwrap());
    }

    #[test]
    fn concat_appends_to_raw_storage() {
        let mut n = ns();
        n.setvar("acc", "a");
        do_concat("acc 'b", &mut n).unwrap();
        assert_eq!(n.get("acc"), "ab");
    }

    #[test]
    fn unescape_percent_decodes_in_place() {
        let mut n = ns();
        n.setvar("u", "hello%20world");
        do_unescape("u", &mut n);
        assert_eq!(n.get("u"), "hello world");
    }
}
