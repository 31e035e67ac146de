//! The final output of a resolve call. See spec.md §3 and §6.

use crate::namespace::Namespace;

/// A directly fetchable media request, built from whatever the processor
/// script left in the namespace when it reached `play` (or v1's no-regex
/// terminal line).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDescriptor {
    pub url: String,
    pub referer: String,
    pub agent: String,
    pub player: String,
    pub swfurl: String,
    pub playpath: String,
}

pub(crate) fn build_from_namespace(ns: &Namespace) -> ResolvedDescriptor {
    ResolvedDescriptor {
        url: ns.get("url"),
        referer: ns.get("referer"),
        agent: ns.get("agent"),
        player: ns.get("player"),
        swfurl: ns.get("swfurl"),
        playpath: ns.get("playpath"),
    }
}
