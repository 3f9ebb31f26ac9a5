// Screen automation control loop
// Captures a frame, looks for each template in priority order and clicks
// inside the first confident match.

pub mod channels;
pub mod click;
pub mod decision;
pub mod fsm;
pub mod template;
pub mod types;


pub use channels::{create_shutdown_channel, shutdown_requested, spawn_shutdown_listener};
pub use click::{ClickRegion, ClickSampler, ClickTarget};
pub use decision::DecisionPolicy;
pub use fsm::ControlLoop;
pub use template::{TemplateError, TemplateImage, TemplateStore};
pub use types::{IterationReport, LoopState, TemplateEvaluation};
