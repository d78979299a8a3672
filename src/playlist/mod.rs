pub mod fetcher;
pub mod options;
pub mod queries;
pub mod recommender;

pub use options::*;
pub use queries::*;
pub use recommender::*;
