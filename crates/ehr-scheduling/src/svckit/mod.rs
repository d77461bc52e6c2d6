//! Service Kit - Scheduling Tools
//!
//! Tool catalogue, argument parsing and the dispatcher that runs calls
//! against an [`EhrGateway`](crate::gateway::EhrGateway).

mod args;
mod catalog;
mod dispatcher;

pub use args::SchedulingCall;
pub use catalog::{
    CHECK_AVAILABILITY, CREATE_APPOINTMENT, CREATE_PATIENT, GET_CLINICIANS, GET_LOCATIONS,
    scheduling_tools, tool_definitions,
};
pub use dispatcher::SchedulingDispatcher;
