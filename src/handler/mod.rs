mod definition;
mod diagnostics;
mod hover;
mod resolve;

pub use definition::DefinitionHandler;
pub use diagnostics::{DIAGNOSTIC_SOURCE, DiagnosticsHandler, full_report};
pub use hover::{HoverHandler, render_element};
pub use resolve::{DefinitionLink, Resolver, token_at};
