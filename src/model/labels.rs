use std::collections::HashMap;

/// Output order of the classifier. Index `i` of the model output is `LABELS[i]`;
/// this must follow the trained output layer.
pub const LABELS: [&str; 25] = [
    "E-waste",
    "Organics",
    "aerosol_cans",
    "automobile wastes",
    "battery waste",
    "cardboard_boxes",
    "clothing",
    "food_and_organic_waste",
    "glass waste",
    "glass_containers",
    "light bulbs",
    "metal waste",
    "metal_cans",
    "paper_and_print",
    "paper_cups",
    "plastic disposables",
    "plastic waste",
    "plastic_bags",
    "plastic_bottles",
    "plastic_detergent_bottles",
    "plastic_food_containers",
    "shoes",
    "steel_food_cans",
    "styrofoam_containers",
    "utensils",
];

pub const FALLBACK_CATEGORY: &str = "Check Local Guidelines";

const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    ("E-waste", &["Recyclable (Special Handling)", "Resellable"]),
    ("Organics", &["Biodegradable (Compostable)"]),
    ("aerosol_cans", &["Recyclable (Empty, Check Local)"]),
    (
        "automobile wastes",
        &["Recyclable (Special Handling)", "Resellable (Parts)"],
    ),
    ("battery waste", &["Recyclable (Special Handling)"]),
    ("cardboard_boxes", &["Recyclable", "Biodegradable"]),
    (
        "clothing",
        &[
            "Reusable",
            "Resellable",
            "Biodegradable (Natural Fibers)",
            "Recyclable (Textile Programs)",
        ],
    ),
    ("food_and_organic_waste", &["Biodegradable (Compostable)"]),
    ("glass waste", &["Recyclable"]),
    ("glass_containers", &["Recyclable", "Reusable", "Resellable"]),
    ("light bulbs", &["Recyclable (Special Handling)"]),
    ("metal waste", &["Recyclable", "Resellable"]),
    ("metal_cans", &["Recyclable"]),
    ("paper_and_print", &["Recyclable", "Biodegradable"]),
    (
        "paper_cups",
        &["Recyclable (Check Local)", "Biodegradable (If unlined)"],
    ),
    ("plastic disposables", &["Check Local (Often Not Recyclable)"]),
    ("plastic waste", &["Check Local (Depends on Type)"]),
    ("plastic_bags", &["Recyclable (Special Programs)"]),
    ("plastic_bottles", &["Recyclable"]),
    (
        "plastic_detergent_bottles",
        &["Recyclable (Check Local)", "Reusable (Non-food)"],
    ),
    (
        "plastic_food_containers",
        &["Recyclable (Check Type/Local)", "Reusable"],
    ),
    (
        "shoes",
        &["Reusable", "Resellable", "Recyclable (Special Programs)"],
    ),
    ("steel_food_cans", &["Recyclable"]),
    ("styrofoam_containers", &["Check Local (Often Not Recyclable)"]),
    (
        "utensils",
        &["Reusable", "Resellable (Metal)", "Check Local (Plastic)"],
    ),
];

/// Label -> functional disposal categories. Built once at startup, read-only after.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    entries: HashMap<String, Vec<String>>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::from_table(CATEGORY_TABLE)
    }

    /// Builds the map from `table`, then gives every label in [`LABELS`] that
    /// the table misses (or lists with no categories) the fallback entry.
    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        let mut entries: HashMap<String, Vec<String>> = table
            .iter()
            .filter(|(_, cats)| !cats.is_empty())
            .map(|(label, cats)| {
                (
                    label.to_string(),
                    cats.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();

        for label in LABELS {
            entries.entry(label.to_string()).or_insert_with(|| {
                tracing::warn!(label, "no functional categories, using fallback");
                vec![FALLBACK_CATEGORY.to_string()]
            });
        }

        Self { entries }
    }

    /// Categories for `label`, or the single fallback category.
    pub fn lookup(&self, label: &str) -> Vec<String> {
        self.entries
            .get(label)
            .cloned()
            .unwrap_or_else(|| vec![FALLBACK_CATEGORY.to_string()])
    }
}
