// Core modules implementing table parsing, record projection, sorting, and error modeling.
pub mod cell;
pub mod error;
pub mod record;
pub mod sort;
pub mod table;
