//! Phase Driver: fetch processor output, choose dialect, run it, handle
//! `report` continuations, detect loops, return the final descriptor.
//! See spec.md §4.6.

use tracing::instrument;

use crate::descriptor::ResolvedDescriptor;
use crate::dialect::{self, DialectOutcome};
use crate::error::{NiplError, NiplLoopError, ResolveError};
use crate::http::{Action, FetchRequest, HttpClient, Method};
use crate::session::ProcessorSession;

/// Drives `START -> FETCH_PROC -> RUN_PROC -> {DONE | ADVANCE | FAIL}` until
/// `play` or a fatal error.
#[instrument(skip(session, http), fields(proc_url = %session.proc_url))]
pub async fn run(
    session: &mut ProcessorSession,
    http: &dyn HttpClient,
) -> Result<ResolvedDescriptor, ResolveError> {
    loop {
        match fetch_and_run_one_phase(session, http).await? {
            DialectOutcome::Play(descriptor) => return Ok(descriptor),
            DialectOutcome::Advance => {
                session.namespace.reset_phase();
                session.namespace.advance_phase();
                if let Some(max) = session.max_phases {
                    if session.namespace.phase() > max {
                        return Err(NiplLoopError.into());
                    }
                }
            }
        }
    }
}

#[instrument(skip(session, http), fields(phase = session.namespace.phase()))]
async fn fetch_and_run_one_phase(
    session: &mut ProcessorSession,
    http: &dyn HttpClient,
) -> Result<DialectOutcome, ResolveError> {
    let phase = session.namespace.phase();

    let mut procargs: Vec<(String, String)> = Vec::new();
    if phase == 0 {
        procargs.push(("url".to_string(), session.namespace.get("s_url")));
    } else {
        procargs.push(("phase".to_string(), phase.to_string()));
        procargs.extend(
            session
                .namespace
                .report_vars()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    check_and_record_fingerprint(session, &procargs)?;

    let mut query_url = session.proc_url.clone();
    query_url.query_pairs_mut().extend_pairs(procargs.iter());

    tracing::debug!(phase, url = %query_url, "fetching processor");

    let request = FetchRequest {
        method: Method::Get,
        action: Action::Read,
        agent: session.default_agent.clone(),
        referer: String::new(),
        cookie: format!("version={}; platform={}", session.version, session.platform),
        postdata: String::new(),
        headers: http::HeaderMap::new(),
    };

    let response = http
        .fetch(query_url.as_str(), &request)
        .await
        .map_err(ResolveError::from)?;

    if response.content.trim().is_empty() {
        return Err(NiplError::ScriptError("processor URL returned nothing".to_string()).into());
    }

    let mut lines: Vec<&str> = response.content.split('\n').collect();
    if lines.first().is_some_and(|l| l.trim() == "v2") {
        session.force_v2 = true;
        lines.remove(0);
    }

    if session.force_v2 {
        dialect::v2::run(&lines, &mut session.namespace, http, &mut session.cookie_jar).await
    } else {
        dialect::v1::run(&lines, &mut session.namespace, http, &mut session.cookie_jar).await
    }
}

/// Canonicalizes `(proc_url, sorted report-var pairs)` into one string and
/// fails if it has been seen before this session (spec.md §9 Design Notes,
/// §8 property 4).
fn check_and_record_fingerprint(
    session: &mut ProcessorSession,
    procargs: &[(String, String)],
) -> Result<(), NiplLoopError> {
    let mut sorted = procargs.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut fingerprint = session.proc_url.to_string();
    for (k, v) in &sorted {
        fingerprint.push('&');
        fingerprint.push_str(k);
        fingerprint.push('=');
        fingerprint.push_str(v);
    }
    if !session.seen_fingerprints.insert(fingerprint) {
        return Err(NiplLoopError);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nookies::InMemoryNookieStore;
    use std::sync::Arc;
    use url::Url;

    fn session() -> ProcessorSession {
        ProcessorSession::new(
            "http://source.example/item",
            Url::parse("http://processor.example/resolve").unwrap(),
            "unknown",
            "3.7",
            crate::http::DEFAULT_USER_AGENT,
            None,
            Arc::new(InMemoryNookieStore::new()),
        )
    }

    #[test]
    fn records_first_occurrence_and_rejects_repeat() {
        let mut s = session();
        let args = vec![("phase".to_string(), "1".to_string()), ("v1".to_string(), "42".to_string())];
        check_and_record_fingerprint(&mut s, &args).unwrap();
        let err = check_and_record_fingerprint(&mut s, &args).unwrap_err();
        assert_eq!(err.to_string(), NiplLoopError.to_string());
    }

    #[test]
    fn fingerprint_is_independent_of_argument_order() {
        let mut s = session();
        let args_a = vec![("phase".to_string(), "1".to_string()), ("v1".to_string(), "42".to_string())];
        let args_b = vec![("v1".to_string(), "42".to_string()), ("phase".to_string(), "1".to_string())];
        check_and_record_fingerprint(&mut s, &args_a).unwrap();
        assert!(check_and_record_fingerprint(&mut s, &args_b).is_err());
    }

    #[test]
    fn differing_arguments_never_collide() {
        let mut s = session();
        let phase1 = vec![("phase".to_string(), "1".to_string())];
        let phase2 = vec![("phase".to_string(), "2".to_string())];
        check_and_record_fingerprint(&mut s, &phase1).unwrap();
        check_and_record_fingerprint(&mut s, &phase2).unwrap();
    }
}
