pub mod stage1_load;
pub mod stage2_fit;
pub mod stage3_anomalies;
pub mod stage4_thresholds;
pub mod stage5_quant;
pub mod stage6_features;
pub mod stage7_classify;
pub mod stage8_report;
