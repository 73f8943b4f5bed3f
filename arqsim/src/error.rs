use thiserror::Error;

/// All errors produced by the simulator core.
///
/// Only configuration problems surface as errors; runtime anomalies such as
/// hitting the event cap are reported through fields on the result record.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no data loaded into the simulation")]
    NoDataLoaded,

    #[error("window size must be at least 1")]
    InvalidWindow,

    #[error("frame payload ({payload} B) must exceed the transport header ({header} B)")]
    PayloadTooSmall { payload: usize, header: usize },

    #[error("bit rate must be positive")]
    InvalidBitRate,
}

pub type Result<T> = std::result::Result<T, SimError>;
