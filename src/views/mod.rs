//! Page wiring: connects presentational props to the store.

pub mod job_details;

pub use job_details::{
    map_state_to_props, JobDetailsDispatchProps, JobDetailsPage, JobDetailsStateProps,
};
