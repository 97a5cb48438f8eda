use rustc_hash::FxHashMap;

use crate::definition::ModelDefinition;
use crate::errors::Result;

/// A format decoder, provided by the host application.
///
/// Parsers run entirely at the load boundary; whatever they return is
/// validated before any instance evaluates against it.
pub trait ModelParser {
    fn parse(&self, data: &[u8]) -> Result<ModelDefinition>;
}

/// Maps format tags to the decoders the host chose to enable.
///
/// The registry is an explicit value handed to
/// [`Viewer::new`](crate::Viewer::new); there is no process-wide handler map.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, Box<dyn ModelParser>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parser for `format`, replacing any previous one.
    pub fn register(&mut self, format: &str, parser: Box<dyn ModelParser>) {
        self.handlers.insert(format.to_string(), parser);
    }

    #[must_use]
    pub fn get(&self, format: &str) -> Option<&dyn ModelParser> {
        self.handlers.get(format).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn contains(&self, format: &str) -> bool {
        self.handlers.contains_key(format)
    }
}
