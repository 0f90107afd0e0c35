pub mod catalog;
pub mod step;
pub mod steps;

pub use catalog::{definition, Service};
pub use step::{Fatality, StepContext, StepError, WorkflowDefinition, WorkflowStep};
