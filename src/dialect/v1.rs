//! Dialect v1: a two-line form, URL then optional regex, scraped once per
//! phase. See spec.md §4.5.

use crate::cookies::CookieJar;
use crate::descriptor::{self, ResolvedDescriptor};
use crate::error::{ParseError, ResolveError};
use crate::http::HttpClient;
use crate::namespace::Namespace;

use super::DialectOutcome;

/// Runs one v1 processor body: `lines[0]` is the URL, `lines[1]` (if
/// present) is a regex to scrape the URL with before advancing.
pub(crate) async fn run(
    lines: &[&str],
    ns: &mut Namespace,
    http: &dyn HttpClient,
    jar: &mut CookieJar,
) -> Result<DialectOutcome, ResolveError> {
    let mut iter = lines.iter();
    let url = iter
        .next()
        .ok_or_else(|| ParseError::MalformedLine("empty v1 processor body".to_string()))?;

    match iter.next() {
        None => Ok(DialectOutcome::Play(terminal_descriptor(url, ns))),
        Some(regex) => {
            ns.setvar("s_url", (*url).to_string());
            ns.setvar("regex", (*regex).to_string());
            crate::eval::do_scrape(ns, http, jar).await?;
            Ok(DialectOutcome::Advance)
        }
    }
}

fn terminal_descriptor(url: &str, ns: &Namespace) -> ResolvedDescriptor {
    let mut descriptor = descriptor::build_from_namespace(ns);
    descriptor.url = url.to_string();
    descriptor.referer = ns.get("s_url");
    descriptor
}
