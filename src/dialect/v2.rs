//! Dialect v2: full imperative form with `if`/`elseif`/`else`/`endif`.
//! See spec.md §4.4 (conditionals) and §6 (grammar).

use crate::cookies::CookieJar;
use crate::descriptor;
use crate::error::{NiplError, ResolveError};
use crate::eval::{self, Signal};
use crate::http::HttpClient;
use crate::namespace::Namespace;

use super::DialectOutcome;

/// Runs a v2 processor body line by line, tracking the single-level
/// `if`/`elseif`/`else`/`endif` ladder described in spec.md §4.4: once any
/// branch within one `if..endif` has evaluated true, later `elseif`/`else`
/// branches in the same block are skipped.
pub(crate) async fn run(
    lines: &[&str],
    ns: &mut Namespace,
    http: &dyn HttpClient,
    jar: &mut CookieJar,
) -> Result<DialectOutcome, ResolveError> {
    let mut in_if = false;
    let mut branch_active = true;
    let mut if_was_true = false;

    for raw in lines {
        let line = raw.trim_start().trim_end_matches(['\r', '\n']);
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        if in_if {
            if line.starts_with("if ") {
                return Err(NiplError::NestedIf.into());
            }
            if line == "endif" {
                in_if = false;
                if_was_true = false;
                continue;
            }
            if line == "else" {
                branch_active = !if_was_true;
                continue;
            }
            if let Some(rest) = line.strip_prefix("elseif ") {
                if !if_was_true {
                    branch_active = eval::eval_expr(rest, ns)?;
                    if_was_true = branch_active;
                } else {
                    branch_active = false;
                }
                continue;
            }
            if !branch_active {
                continue;
            }
        } else if let Some(rest) = line.strip_prefix("if ") {
            in_if = true;
            branch_active = eval::eval_expr(rest, ns)?;
            if_was_true = branch_active;
            continue;
        }

        match eval::execute_line(line, ns, http, jar).await? {
            Signal::Continue => {}
            Signal::Report => return Ok(DialectOutcome::Advance),
            Signal::Play => return Ok(DialectOutcome::Play(descriptor::build_from_namespace(ns))),
        }
    }

    // A script that falls off the end without an explicit `play`/`report`
    // is treated as an implicit `play`, matching the original
    // interpreter's unconditional return of the built descriptor.
    Ok(DialectOutcome::Play(descriptor::build_from_namespace(ns)))
}
