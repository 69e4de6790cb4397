pub mod admission;
pub mod config;
pub mod device;
pub mod metrics;
pub mod orchestrator;
pub mod recognizer;
pub mod task;
pub mod testing;

pub use admission::{
    AdmissionConfig, AdmissionController, AdmissionError, AdmissionPermit, AdmissionStatus,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, CONFIG_PATH_ENV,
};
pub use device::{DeviceError, DevicePool, DeviceSlot, DeviceStatus};
pub use orchestrator::{OcrOrchestrator, OrchestratorConfig, OrchestratorError, OrchestratorStatus};
pub use recognizer::{
    JobDescriptor, LoadError, OcrResult, RecognitionError, Recognizer, TextPosition, TextRegion,
    Unit, UnitLoader,
};
pub use task::{
    ErrorKind, MemoryTaskStore, Task, TaskError, TaskFailure, TaskFilter, TaskStatistics,
    TaskStatus, TaskStore,
};
