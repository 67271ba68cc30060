pub mod grid;
pub mod info;
pub mod unify;
