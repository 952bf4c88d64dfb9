// Application layer - read models and form-driven mutations over the store

pub mod dashboard;
pub mod error;
pub mod forms;
pub mod mutations;
pub mod queries;
pub mod revalidate;

pub use dashboard::*;
pub use error::*;
pub use forms::*;
pub use mutations::*;
pub use queries::*;
pub use revalidate::*;
