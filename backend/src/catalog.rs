use shared::{DiseaseRecord, Severity};
use std::collections::HashMap;

/// Immutable table of disease metadata, built once at startup and handed to
/// the request handlers as shared state.
#[derive(Clone)]
pub struct DiseaseCatalog {
    records: HashMap<String, DiseaseRecord>,
}

fn record(
    description: &str,
    symptoms: &str,
    treatment: &str,
    severity: Severity,
    color: &str,
) -> DiseaseRecord {
    DiseaseRecord {
        description: description.to_string(),
        symptoms: symptoms.to_string(),
        treatment: treatment.to_string(),
        severity,
        color: color.to_string(),
    }
}

impl DiseaseCatalog {
    pub fn new() -> Self {
        let mut records = HashMap::new();
        records.insert(
            "Citrus Canker".to_string(),
            record(
                "A serious bacterial disease that affects citrus plants, including guava trees.",
                "Raised, corky lesions on leaves, stems, and fruits with water-soaked margins.",
                "Remove infected plant parts, apply copper-based fungicides, and maintain good sanitation.",
                Severity::High,
                "#FF6B6B",
            ),
        );
        records.insert(
            "Red Rust".to_string(),
            record(
                "A fungal disease caused by Cephaleuros virescens that affects guava leaves.",
                "Circular to irregular reddish-brown spots on leaves, often with a velvety appearance.",
                "Improve air circulation, remove infected leaves, and apply fungicides if necessary.",
                Severity::Medium,
                "#FF8E53",
            ),
        );
        records.insert(
            "Anthracnose".to_string(),
            record(
                "A fungal disease caused by Colletotrichum gloeosporioides that affects guava fruits and leaves.",
                "Dark, sunken lesions on fruits and leaves, often with pink spore masses.",
                "Prune infected parts, apply fungicides, and maintain proper spacing between plants.",
                Severity::Medium,
                "#8B4513",
            ),
        );
        records.insert(
            "Spiraling Whitefly".to_string(),
            record(
                "An insect pest that feeds on guava leaves, causing damage and spreading diseases.",
                "Yellowing leaves, white waxy deposits, and stunted growth due to feeding damage.",
                "Use insecticidal soaps, neem oil, or introduce natural predators like ladybugs.",
                Severity::Low,
                "#87CEEB",
            ),
        );
        records.insert(
            "Healthy".to_string(),
            record(
                "The guava leaf shows no signs of disease or pest damage.",
                "Normal green color, uniform leaf structure, and healthy appearance.",
                "Continue with regular maintenance and monitoring for early detection.",
                Severity::None,
                "#4CAF50",
            ),
        );
        records.insert(
            "Algal Spot".to_string(),
            record(
                "A disease caused by algae that affects guava leaves, especially in humid conditions.",
                "Small, circular to irregular spots with a velvety texture, often greenish to reddish-brown.",
                "Improve air circulation, reduce humidity, and apply copper-based fungicides.",
                Severity::Low,
                "#9ACD32",
            ),
        );
        Self { records }
    }

    pub fn get(&self, name: &str) -> Option<&DiseaseRecord> {
        self.records.get(name)
    }

    /// Lookup used when enriching a prediction response; an unknown label
    /// yields an empty record rather than an error.
    pub fn enrich(&self, name: &str) -> DiseaseRecord {
        self.get(name).cloned().unwrap_or_default()
    }
}

impl Default for DiseaseCatalog {
    fn default() -> Self {
        Self::new()
    }
}
