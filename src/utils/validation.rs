use validator::Validate;

use crate::error::Result;

/// Runs the `validator` derive rules and lifts failures into the API error type.
pub fn validate<T: Validate>(val: &T) -> Result<()> {
    val.validate()?;
    Ok(())
}
