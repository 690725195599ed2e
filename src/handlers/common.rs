use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement body returned by mutating endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"message": "Producto actualizado correctamente"}))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
