use govee_proto::FrameError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Rejected locally, nothing was sent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Frame(FrameError),
    /// The device does not expose the expected profile
    #[error("characteristic missing: {0}")]
    CharacteristicMissing(String),
    /// Out of range, powered off, or gone
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    /// Radio or link hiccup, worth retrying after a reconnect
    #[error("transient transport error: {0}")]
    Transient(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unreachable: {0}")]
    Unreachable(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    /// Errors a retry cannot fix
    pub fn is_permanent(&self) -> bool {
        matches!(self, Error::DeviceNotFound(_) | Error::CharacteristicMissing(_))
    }

    /// Failures raised by the transport, as opposed to local validation
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transient(_) | Error::Transport(_) | Error::DeviceNotFound(_)
        )
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::PayloadTooLong(_) => Error::InvalidArgument(e.to_string()),
            FrameError::MalformedFrame(_) => Error::Frame(e),
        }
    }
}

impl From<btleplug::Error> for Error {
    fn from(e: btleplug::Error) -> Self {
        use btleplug::Error as B;
        match e {
            B::DeviceNotFound => Error::DeviceNotFound(e.to_string()),
            B::NoSuchCharacteristic => Error::CharacteristicMissing(e.to_string()),
            B::NotConnected | B::TimedOut(_) | B::RuntimeError(_) | B::Other(_) => {
                Error::Transient(e.to_string())
            }
            other => Error::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn classification() {
        assert!(Error::Transient("link".into()).is_transient());
        assert!(!Error::Transient("link".into()).is_permanent());
        assert!(Error::DeviceNotFound("gone".into()).is_permanent());
        assert!(Error::CharacteristicMissing("2b11".into()).is_permanent());
        assert!(!Error::Transport("other".into()).is_transient());
        assert!(!Error::InvalidArgument("x".into()).is_transport());
    }

    #[test]
    fn btleplug_errors_map_to_taxonomy() {
        assert!(Error::from(btleplug::Error::DeviceNotFound).is_permanent());
        assert!(Error::from(btleplug::Error::NotConnected).is_transient());
        assert!(Error::from(btleplug::Error::TimedOut(Duration::from_secs(1))).is_transient());
        assert!(matches!(
            Error::from(btleplug::Error::NoSuchCharacteristic),
            Error::CharacteristicMissing(_)
        ));
        assert!(matches!(
            Error::from(btleplug::Error::PermissionDenied),
            Error::Transport(_)
        ));
    }

    #[test]
    fn frame_errors_convert() {
        let e: Error = FrameError::PayloadTooLong(18).into();
        assert!(matches!(e, Error::InvalidArgument(_)));
        let e: Error = FrameError::MalformedFrame(3).into();
        assert!(matches!(e, Error::Frame(_)));
    }
}
