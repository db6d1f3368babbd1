use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("A {width}x{height} frame is too small to host a ball")]
    FrameTooSmall { width: u32, height: u32 },
    #[error("The frame buffer holds {actual} bytes but {expected} were expected")]
    FrameBufferSize { expected: usize, actual: usize },
    #[error("The frame source ended before the first frame was delivered")]
    NoInitialFrame,
    #[error("The configuration could not be parsed")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
}
