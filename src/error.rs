use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure classes of a benchmark iteration.
///
/// The class decides how far a failure propagates: a configuration error
/// aborts every iteration of that configuration, a provisioning error aborts
/// the current iteration before anything is measured, and an execution error
/// discards the sample of the failed fetch.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The implementation name or another configuration value is unusable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Scratch space or repository preparation failed during setup
    #[error("provisioning error: {context}")]
    Provisioning {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The timed fetch failed
    #[error("execution error: {context}")]
    Execution {
        context: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl BenchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn provisioning(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Provisioning {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn provisioning_msg(context: impl Into<String>) -> Self {
        Self::Provisioning {
            context: context.into(),
            source: None,
        }
    }

    pub fn execution(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Execution {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn execution_msg(context: impl Into<String>) -> Self {
        Self::Execution {
            context: context.into(),
            source: None,
        }
    }

    /// Whether this error invalidates the whole configuration rather than a
    /// single iteration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The error message followed by its chain of causes
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
