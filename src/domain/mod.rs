//! Domain layer - Core pipeline types, traits and algorithms

pub mod dataset;
pub mod drift;
pub mod error;
pub mod features;
pub mod frame;
pub mod model;
pub mod record;
pub mod registry;
pub mod request_log;
pub mod search;
pub mod storage;
pub mod transform;

pub use dataset::{train_test_split, DatasetSource, DatasetStore, SplitSide, TrainTestSplit};
pub use drift::{DriftDetector, DriftReport, DriftSchema, DriftThresholds};
pub use error::{DomainError, ErrorKind};
pub use features::{derive, derive_all, derive_frame, drop_zero_listening_time};
pub use frame::{ColumnData, FeatureFrame};
pub use model::{
    default_param_grid, BayesianRidgeFamily, EstimatorFamily, ParamGrid, Regressor, TrainedModel,
};
pub use record::{LabeledRecord, PublicationDay, PublicationTime, RawRecord};
pub use registry::{ModelRegistry, ModelUri, RegisteredModel, RunParameters, RunParamsStore};
pub use request_log::{LiveObservation, PredictionEntry, RequestStore, SubmittedRequest};
pub use search::{search, SearchConfig, SearchContext, SearchOutcome};
pub use storage::{ArtifactStore, ArtifactStoreExt};
pub use transform::FittedTransform;
