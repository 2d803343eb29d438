//! Lane primitives shared by the solvers and the command line front end.

mod lane;
mod window;

pub use lane::*;
pub use window::*;
