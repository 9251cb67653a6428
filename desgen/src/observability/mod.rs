//! Observability utilities: subscriber setup and stage timing.

mod logging;
mod tracing;

pub use logging::{default_directives, init_logging};
pub use tracing::{SpanTimer, StageSpanAttributes};
