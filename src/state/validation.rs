use crate::error::AppError;
use crate::model::ModelDescriptor;
use crate::state::RequestContext;

/// Resolve the model descriptor from the request context. It must be present
/// and describe a record-shaped type.
pub fn validate_model(ctx: &RequestContext) -> Result<&ModelDescriptor, AppError> {
    let model = ctx
        .model
        .as_deref()
        .ok_or_else(|| AppError::InvalidContext("model not found in context".into()))?;
    if !model.is_struct_shaped() {
        return Err(AppError::InvalidContext("invalid model type".into()));
    }
    Ok(model)
}
