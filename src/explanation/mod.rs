pub mod types;
pub mod comparator;
pub mod analyzer;
pub mod formatters;

pub use types::{Deviation, Explanation, UNAVAILABLE_MESSAGE};
pub use comparator::{compare_to_range, RangeComparison, RangeFit};
pub use analyzer::explain_crop;
pub use formatters::{JsonFormatter, MarkdownFormatter};
