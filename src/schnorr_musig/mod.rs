pub mod musig_math;
pub mod musig_protocol;
pub mod session;
