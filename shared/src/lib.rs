use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString,
)]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DiseaseRecord {
    pub description: String,
    pub symptoms: String,
    pub treatment: String,
    pub severity: Severity,
    pub color: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: String,
    pub confidence: f32,
    pub disease_info: DiseaseRecord,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelStatsResponse {
    pub class_names: Vec<String>,
    pub image_size: u32,
    pub training_history: String,
    pub classification_report: String,
}
