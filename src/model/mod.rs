pub mod anomalies;
pub mod classes;
pub mod features;
pub mod fit;
pub mod thresholds;
pub mod trace;
pub mod weights;
