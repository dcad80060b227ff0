use std::sync::Arc;

use super::config::ConfigError;

pub const NUM_CLASSES: usize = 43;

/// German Traffic Sign Recognition Benchmark class names, indexed by model output.
pub const GTSRB_LABELS: [&str; NUM_CLASSES] = [
    "Speed limit (20km/h)",
    "Speed limit (30km/h)",
    "Speed limit (50km/h)",
    "Speed limit (60km/h)",
    "Speed limit (70km/h)",
    "Speed limit (80km/h)",
    "End of speed limit (80km/h)",
    "Speed limit (100km/h)",
    "Speed limit (120km/h)",
    "No passing",
    "No passing >3.5t",
    "Right of way",
    "Priority road",
    "Yield",
    "Stop",
    "No vehicles",
    ">3.5t prohibited",
    "No entry",
    "General caution",
    "Left curve",
    "Right curve",
    "Double curve",
    "Bumpy road",
    "Slippery road",
    "Road narrows (right)",
    "Road work",
    "Traffic signals",
    "Pedestrians",
    "Children crossing",
    "Bicycles crossing",
    "Ice/snow",
    "Animals crossing",
    "End restrictions",
    "Turn right",
    "Turn left",
    "Ahead only",
    "Straight or right",
    "Straight or left",
    "Keep right",
    "Keep left",
    "Roundabout",
    "End no passing",
    "End no passing >3.5t",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn gtsrb() -> Self {
        Self {
            labels: GTSRB_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Builds a table from custom wording; the length must match the model output.
    pub fn from_labels(labels: Vec<String>) -> Result<Self, ConfigError> {
        if labels.len() != NUM_CLASSES {
            return Err(ConfigError::LabelCount {
                expected: NUM_CLASSES,
                actual: labels.len(),
            });
        }
        Ok(Self { labels })
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(String::as_str).enumerate()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::gtsrb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gtsrb_table_is_contiguous() {
        let table = LabelTable::gtsrb();
        assert_eq!(table.len(), NUM_CLASSES);
        for (expected, (index, label)) in table.iter().enumerate() {
            assert_eq!(index, expected);
            assert!(!label.is_empty());
        }
        assert_eq!(table.get(NUM_CLASSES), None);
    }

    #[test]
    fn test_known_labels() {
        let table = LabelTable::gtsrb();
        assert_eq!(table.get(0), Some("Speed limit (20km/h)"));
        assert_eq!(table.get(14), Some("Stop"));
        assert_eq!(table.get(42), Some("End no passing >3.5t"));
    }

    #[test]
    fn test_custom_labels_must_have_43_entries() {
        let short = vec!["a".to_string(); 10];
        assert!(matches!(
            LabelTable::from_labels(short),
            Err(ConfigError::LabelCount { expected: 43, actual: 10 })
        ));

        let full: Vec<String> = (0..NUM_CLASSES).map(|i| format!("class {i}")).collect();
        let table = LabelTable::from_labels(full).unwrap();
        assert_eq!(table.get(7), Some("class 7"));
    }
}
