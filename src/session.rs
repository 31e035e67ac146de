//! Processor Session: one call to the resolver. See spec.md §3.

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::cookies::CookieJar;
use crate::namespace::Namespace;
use crate::nookies::NookieStore;

pub struct ProcessorSession {
    pub(crate) namespace: Namespace,
    pub(crate) cookie_jar: CookieJar,
    pub(crate) proc_url: Url,
    pub(crate) platform: String,
    pub(crate) version: String,
    pub(crate) default_agent: String,
    pub(crate) force_v2: bool,
    pub(crate) max_phases: Option<u32>,
    /// Canonicalized `(proc_url, sorted report-vars)` fingerprints already
    /// issued this session; append-only (spec.md §3 "Invariants").
    pub(crate) seen_fingerprints: HashSet<String>,
}

impl ProcessorSession {
    pub fn new(
        source_url: impl Into<String>,
        proc_url: Url,
        platform: impl Into<String>,
        version: impl Into<String>,
        default_agent: impl Into<String>,
        max_phases: Option<u32>,
        nookies: Arc<dyn NookieStore>,
    ) -> Self {
        let default_agent = default_agent.into();
        Self {
            namespace: Namespace::new(source_url, default_agent.clone(), nookies),
            cookie_jar: CookieJar::new(),
            proc_url,
            platform: platform.into(),
            version: version.into(),
            default_agent,
            force_v2: false,
            max_phases,
            seen_fingerprints: HashSet::new(),
        }
    }
}
