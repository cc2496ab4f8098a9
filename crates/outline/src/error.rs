use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("Invalid image ({width}x{height}): {reason}")]
    InvalidImage {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("Invalid parameter `{name}`: {value} is outside [{min}, {max}]")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{failed} of {total} {stage} workers failed: {details}")]
    WorkerFailure {
        stage: &'static str,
        failed: usize,
        total: usize,
        details: String,
    },

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutlineError {
    pub(crate) fn invalid_image(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Checks that `value` lies in the inclusive range `[min, max]`; NaN never does.
    pub(crate) fn check_range<T>(name: &'static str, value: T, min: T, max: T) -> Result<()>
    where
        T: PartialOrd + Into<f64> + Copy,
    {
        if !(min..=max).contains(&value) {
            return Err(Self::InvalidParameter {
                name,
                value: value.into(),
                min: min.into(),
                max: max.into(),
            });
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, OutlineError>;
