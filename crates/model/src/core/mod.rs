pub mod location;
pub mod object;
