//! Error types for the mapping engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The mapping document is not structurally valid XML, or a control
    /// element is missing one of its required scalar fields. Fatal to
    /// loading that mapping; any previously active mapping stays in place.
    #[error("malformed mapping document: {0}")]
    MalformedDocument(String),

    /// A referenced controller script failed to evaluate. Fatal to loading.
    #[error("script {file} failed to load: {message}")]
    ScriptLoad { file: String, message: String },

    /// A bound handler threw during dispatch. Recovered locally: logged,
    /// that message's actions default to empty, later messages unaffected.
    #[error("script handler {handler} failed: {message}")]
    ScriptRuntime { handler: String, message: String },

    /// Sandbox setup or `init()` failure.
    #[error("mapping init failed: {0}")]
    Init(String),

    /// Fetching a referenced script source failed.
    #[error("could not load script source {file}: {message}")]
    ScriptSource { file: String, message: String },
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::MalformedDocument(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
