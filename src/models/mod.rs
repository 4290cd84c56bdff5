pub mod job;
pub mod loaders;
pub mod plan;
pub mod settings;
pub mod stage;

pub use job::{CommandTemplates, DeviceEntry, JobFile};
pub use loaders::load_job_file;
pub use plan::{RunPlan, StageDelays, SustainPolicy};
pub use settings::RunSettings;
pub use stage::Stage;
