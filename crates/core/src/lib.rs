pub mod config;
pub mod config_loader;
pub mod config_watcher;
pub mod horizon;
pub mod kelly;
pub mod params;

pub use config::{AppConfig, EngineConfig, HorizonConfig, SchedulerConfig, StressConfig};
pub use config_loader::ConfigLoader;
pub use config_watcher::ConfigWatcher;
pub use horizon::HorizonCalculator;
pub use kelly::{EdgeStatus, KellyReference, DISCIPLINED_RISK_CAP};
pub use params::{
    SimulationParameters, SimulationRequest, SizingMode, ValidationError, Volatility,
};
