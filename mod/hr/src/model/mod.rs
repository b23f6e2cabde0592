mod absence;
mod audit;
mod feedback;

pub use absence::*;
pub use audit::*;
pub use feedback::*;
