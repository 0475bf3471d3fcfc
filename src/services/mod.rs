pub mod catalog;
pub mod recommendations;
pub mod reviews;

pub use recommendations::RecommendationEngine;
