/// Keys the prediction tasks use in the shared flow context.
pub mod session_keys {
    /// Raw [`crate::models::ClaimForm`] as submitted.
    pub const CLAIM_FORM: &str = "claim_form";
    /// Parsed [`crate::models::ClaimFeatures`].
    pub const CLAIM_FEATURES: &str = "claim_features";
    /// [`crate::models::ValidationError`] when the form was rejected.
    pub const VALIDATION_ERROR: &str = "validation_error";
    /// [`crate::models::Label`] produced by the classifier.
    pub const PREDICTION: &str = "prediction";
}
