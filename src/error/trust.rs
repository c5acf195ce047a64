//! Certificate, key and trust-store errors

use super::BerthError;

/// Wraps an error raised while provisioning a trust artifact
pub fn provisioning_failed(artifact: impl Into<String>, source: BerthError) -> BerthError {
    BerthError::TrustProvisioningFailed {
        artifact: artifact.into(),
        source: Box::new(source),
    }
}

/// Creates a key or certificate generation error
pub fn generation_failed(artifact: impl Into<String>, reason: impl std::fmt::Display) -> BerthError {
    let artifact = artifact.into();
    provisioning_failed(
        artifact.clone(),
        BerthError::IoError {
            message: format!("could not generate {artifact}: {reason}"),
        },
    )
}
