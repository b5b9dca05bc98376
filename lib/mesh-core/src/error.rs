use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Registration of {instance_id} failed: {reason}")]
    RegistrationFailed { instance_id: String, reason: String },

    #[error("Discovery lookup for {service} failed: {reason}")]
    LookupFailed { service: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
