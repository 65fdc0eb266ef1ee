//! Query compilers, one per request shape.

mod compile;
mod request;

pub use compile::QueryCompiler;
pub use request::{
    CludeRecv, EndpointMetricRecv, EndpointsRecv, IndexByFullTagsRecv, QueryData, QueryDataForUi,
    TagKv,
};
