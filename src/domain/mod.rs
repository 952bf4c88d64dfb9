mod customer;
mod invoice;
mod money;
mod pagination;
mod revenue;

pub use customer::*;
pub use invoice::*;
pub use money::*;
pub use pagination::*;
pub use revenue::*;
