pub mod interactions;
pub mod recommendation;
