pub mod leave;
pub mod roster;
