pub mod card;
pub mod deck;
pub mod demo;
pub mod policies;
pub mod report;
pub mod review;
pub mod select;
