pub mod object;
pub mod operation;
pub mod options;
pub mod output;

pub use object::*;
pub use operation::*;
pub use options::*;
pub use output::*;
