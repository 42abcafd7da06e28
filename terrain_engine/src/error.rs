use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("degenerate coordinate ({x}, {z}): height queries need finite, in-range input")]
    DegenerateInput { x: f32, z: f32 },
    #[error("surface vertex at ({x}, {z}) produced non-finite height {height}")]
    NonFiniteVertex { x: f32, z: f32, height: f32 },
    #[error("invalid terrain config: {0}")]
    InvalidConfig(String),
    #[error("terrain config parse error: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
    #[error("terrain config io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
