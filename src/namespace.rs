//! The Variable Namespace: scalar variables plus named collections
//! (`cookies`, `headers`, `s_headers`, `nookies`), with typed get/set
//! dispatch on magic names. See spec.md §3 and §4.3.

use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;
use regex::Regex;

use crate::error::NiplError;
use crate::http::{Action, Method};
use crate::nookies::NookieStore;

/// Scalar + collection storage for one phase of one processor session.
///
/// `standard_vars`, `s_headers`, the received-headers/cookies snapshots,
/// and the match state are all reset each phase by [`Namespace::reset_phase`];
/// `phase` and `report_vars` are not (see spec.md §3 "Lifecycles" and
/// DESIGN.md for why `report_vars` persists through the reset here rather
/// than being rebuilt from scratch by the Phase Driver).
pub struct Namespace {
    standard_vars: HashMap<String, String>,
    s_headers: HashMap<String, String>,
    received_headers: HeaderMap,
    received_cookies: Vec<(String, String)>,
    report_vars: HashMap<String, String>,
    last_match_ok: bool,
    verbose: i32,
    phase: u32,
    default_agent: String,
    nookies: Arc<dyn NookieStore>,
}

impl Namespace {
    pub fn new(
        source_url: impl Into<String>,
        default_agent: impl Into<String>,
        nookies: Arc<dyn NookieStore>,
    ) -> Self {
        let mut ns = Self {
            standard_vars: HashMap::new(),
            s_headers: HashMap::new(),
            received_headers: HeaderMap::new(),
            received_cookies: Vec::new(),
            report_vars: HashMap::new(),
            last_match_ok: false,
            verbose: 0,
            phase: 0,
            default_agent: default_agent.into(),
            nookies,
        };
        ns.standard_vars.insert("s_url".to_string(), source_url.into());
        ns.reset_request_defaults();
        ns
    }

    /// `init_vars()` from the original interpreter: reset the per-phase
    /// request variables, received collections and match state. `s_url`
    /// (set once at construction, or by the v1 dialect before a scrape),
    /// `phase` and `report_vars` survive this reset; captures carry into
    /// the next phase's query solely through `report_vars`, not through
    /// any reinitialized namespace entry (spec.md §9 Open Questions).
    pub fn reset_phase(&mut self) {
        let s_url = self.standard_vars.get("s_url").cloned();
        self.standard_vars.clear();
        if let Some(s_url) = s_url {
            self.standard_vars.insert("s_url".to_string(), s_url);
        }
        self.reset_request_defaults();
        self.s_headers.clear();
        self.received_headers = HeaderMap::new();
        self.received_cookies.clear();
        self.last_match_ok = false;
    }

    fn reset_request_defaults(&mut self) {
        self.standard_vars
            .insert("s_method".to_string(), Method::Get.as_str().to_string());
        self.standard_vars
            .insert("s_action".to_string(), Action::Read.as_str().to_string());
        self.standard_vars
            .insert("s_agent".to_string(), self.default_agent.clone());
        self.standard_vars
            .insert("s_referer".to_string(), String::new());
        self.standard_vars
            .insert("s_cookie".to_string(), String::new());
        self.standard_vars
            .insert("s_postdata".to_string(), String::new());
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn advance_phase(&mut self) {
        self.phase += 1;
    }

    pub fn report_vars(&self) -> &HashMap<String, String> {
        &self.report_vars
    }

    pub fn last_match_ok(&self) -> bool {
        self.last_match_ok
    }

    pub fn set_received(&mut self, headers: HeaderMap, cookies: Vec<(String, String)>) {
        self.received_headers = headers;
        self.received_cookies = cookies;
    }

    /// `expand(token)`: universal literal-or-variable rule (spec.md §4.3).
    pub fn expand(&self, token: &str) -> String {
        match token.strip_prefix('\'') {
            Some(literal) => literal.to_string(),
            None => self.get(token),
        }
    }

    /// `get(name)`: dotted collections, magic synthesizers, then plain
    /// storage, falling back to `""` when unknown.
    pub fn get(&self, name: &str) -> String {
        let name = name.trim();
        if let Some((collection, key)) = name.split_once('.') {
            return match collection {
                "cookies" => self
                    .received_cookies
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default(),
                "headers" => self
                    .received_headers
                    .get(key)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string(),
                "s_headers" => self.s_headers.get(key).cloned().unwrap_or_default(),
                "nookies" => self.nookies.get(key),
                _ => String::new(),
            };
        }
        match name {
            "phase" => self.phase.to_string(),
            "nomatch" => if self.last_match_ok { "0" } else { "1" }.to_string(),
            _ => self.standard_vars.get(name).cloned().unwrap_or_default(),
        }
    }

    /// `set(name, raw)`: expand the value, then dispatch to collection
    /// setters, magic setters, or plain storage.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), NiplError> {
        let value = self.expand(raw);
        let name = name.trim();

        if let Some((collection, key)) = name.split_once('.') {
            return match collection {
                "s_headers" => {
                    self.s_headers.insert(key.to_string(), value);
                    Ok(())
                }
                "nookies" => {
                    let expiry = self.get("nookie_expires");
                    let expiry = if expiry.is_empty() { None } else { Some(expiry.as_str()) };
                    self.nookies.set(key, &value, expiry)
                }
                "cookies" | "headers" => Err(NiplError::ReadOnlyCollection {
                    collection: collection.to_string(),
                    key: key.to_string(),
                }),
                other => Err(NiplError::UnknownCollection(other.to_string())),
            };
        }

        match name {
            "s_method" => {
                let method: Method = value.parse()?;
                self.standard_vars
                    .insert("s_method".to_string(), method.as_str().to_string());
                Ok(())
            }
            "s_action" => {
                let action: Action = value.parse()?;
                self.standard_vars
                    .insert("s_action".to_string(), action.as_str().to_string());
                Ok(())
            }
            "phase" | "nomatch" => Err(NiplError::ReadOnlyVariable(name.to_string())),
            _ => {
                self.standard_vars.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// `setvar(name, literal)`: unconditional raw write, used internally
    /// after scrape/match/replace/unescape.
    pub fn setvar(&mut self, name: &str, value: impl Into<String>) {
        self.standard_vars.insert(name.to_string(), value.into());
    }

    pub fn verbose(&self) -> i32 {
        self.verbose
    }

    pub fn set_verbose(&mut self, level: i32) {
        self.verbose = level;
    }

    pub fn set_report_val(&mut self, key: &str, value: String) {
        self.report_vars.insert(key.to_string(), value);
    }

    pub fn method(&self) -> Method {
        self.get("s_method").parse().unwrap_or(Method::Get)
    }

    pub fn action(&self) -> Action {
        self.get("s_action").parse().unwrap_or(Action::Read)
    }

    pub fn s_headers(&self) -> &HashMap<String, String> {
        &self.s_headers
    }

    /// Runs `regex` against `value`, clears `v1..v9`, and on success
    /// populates as many `vN` variables as there are captured groups,
    /// mirroring them into `report_vars` so the Phase Driver has a single
    /// source of truth for the next query (spec.md §4.4 `scrape`; this
    /// mirroring is applied uniformly to the bare `match` command too —
    /// see DESIGN.md).
    pub fn do_match(&mut self, regex: &str, value: &str) -> Result<(), NiplError> {
        self.clear_captures();
        let re = Regex::new(regex)?;
        if let Some(caps) = re.captures(value) {
            self.last_match_ok = true;
            for i in 1..caps.len() {
                if let Some(m) = caps.get(i) {
                    let key = format!("v{i}");
                    self.standard_vars.insert(key.clone(), m.as_str().to_string());
                    self.report_vars.insert(key, m.as_str().to_string());
                }
            }
        }
        Ok(())
    }

    /// Clears `v1..v9` and resets `nomatch` to true, with no regex run —
    /// used by `geturl` scrapes, which bypass matching entirely (spec.md
    /// §4.1; matches the original interpreter's `self.match = None`).
    pub(crate) fn clear_captures(&mut self) {
        for i in 1..10 {
            self.standard_vars.remove(&format!("v{i}"));
        }
        self.last_match_ok = false;
    }
}
