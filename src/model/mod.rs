pub mod analysis;
pub mod span;

pub use analysis::{
    AnalysisRecord, ElementDefinition, ImportEdge, PropertyDescriptor, TemplateBlock,
    TemplateToken, TokenKind,
};
pub use span::{Span, compare_positions};
