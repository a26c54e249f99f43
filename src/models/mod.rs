pub mod feedbackmodels;
pub mod ordermodels;
pub mod projectmodels;
pub mod servicemodels;
