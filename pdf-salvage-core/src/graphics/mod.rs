//! Content stream replay
//!
//! [`interpreter`] executes operators against a [`GraphicsState`];
//! [`replay`] drives it over a whole page, resolving fonts and form XObjects.

pub mod interpreter;
pub mod replay;
pub mod state;

pub use interpreter::{ContentInterpreter, ContentSink, StringMetrics, TextRun};
pub use replay::{page_content, replay_page, FontSource, ImageEvent, PageEvent, TextEvent};
pub use state::{GraphicsState, TextState};
