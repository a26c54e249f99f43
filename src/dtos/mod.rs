pub mod feedbackdtos;
pub mod orderdtos;
pub mod projectdtos;
pub mod servicedtos;

use validator::ValidationError;

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Value must not be blank".into());
        return Err(error);
    }
    Ok(())
}
