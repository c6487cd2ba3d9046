pub mod cv;

pub use cv::{CvRecord, CvRequest, SchemaError};
