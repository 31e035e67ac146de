use thiserror::Error;

/// Transport-layer failure from an [`crate::http::HttpClient`] implementation.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

/// Script-authorship faults: invalid magic-variable values, unknown commands,
/// malformed control flow, and the like.
#[derive(Debug, Error)]
pub enum NiplError {
    #[error("invalid value for s_method: '{0}' (expected 'get' or 'post')")]
    InvalidMethod(String),

    #[error("invalid value for s_action: '{0}' (expected 'read', 'headers' or 'geturl')")]
    InvalidAction(String),

    #[error("{collection}.{key} is read-only")]
    ReadOnlyCollection { collection: String, key: String },

    #[error("{0} is a read-only variable")]
    ReadOnlyVariable(String),

    #[error("unknown variable collection: {0}")]
    UnknownCollection(String),

    #[error("regex must be set to a valid regex before matching")]
    MissingRegex,

    #[error(transparent)]
    BadRegex(#[from] regex::Error),

    #[error("nested if clauses are not supported")]
    NestedIf,

    #[error("unknown NIPL command: {0}")]
    UnknownCommand(String),

    #[error("script error: {0}")]
    ScriptError(String),

    #[error("invalid verbosity level: '{0}'")]
    InvalidVerbosity(String),

    #[error("invalid operator '{0}' in expression")]
    InvalidOperator(String),

    #[error("invalid nookie expiry suffix: '{0}' (expected 'h', 'm', 'd' or none)")]
    InvalidExpiry(String),

    #[error("s_url must be set before scrape")]
    MissingScrapeUrl,
}

/// A line that is not blank/comment, assignment, command, or a recognized
/// control keyword.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed line: '{0}'")]
    MalformedLine(String),
}

/// The loop detector tripped: the driver would have issued an identical
/// processor request twice within one session.
#[derive(Debug, Error)]
#[error("loop detected: processor called twice with identical arguments")]
pub struct NiplLoopError;

/// Top-level error returned by [`crate::resolver::Resolver::resolve`].
///
/// Any of these kinds fails the whole resolve call; no partial descriptor
/// is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Script(#[from] NiplError),

    #[error(transparent)]
    Loop(#[from] NiplLoopError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
