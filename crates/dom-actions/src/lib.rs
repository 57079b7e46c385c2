pub mod click;
pub mod errors;
pub mod flow;
pub mod policy;
pub mod wait;

pub use click::{click_target, ClickTarget};
pub use errors::DomActionError;
pub use flow::{open_and_click, FlowOutcome, FlowRequest, FlowState};
pub use policy::WaitPolicy;
pub use wait::{wait_for_attribute, wait_for_selector};
