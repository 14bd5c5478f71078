//! Movement and template reference data.
//!
//! The catalog holds the movements (with their equipment variants) and the
//! workout templates that sessions are built from. It is user-editable data
//! persisted with the store, not a built-in constant.

use crate::types::*;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The complete catalog of movements and workout templates
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub movements: HashMap<Uuid, Movement>,
    pub templates: HashMap<Uuid, WorkoutTemplate>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty() && self.templates.is_empty()
    }

    pub fn movement(&self, id: Uuid) -> Option<&Movement> {
        self.movements.get(&id)
    }

    pub fn template(&self, id: Uuid) -> Option<&WorkoutTemplate> {
        self.templates.get(&id)
    }

    /// Resolve a variant id to its owning movement and the variant itself
    pub fn variant(&self, id: Uuid) -> Option<(&Movement, &MovementVariant)> {
        self.movements
            .values()
            .find_map(|m| m.variant(id).map(|v| (m, v)))
    }

    /// Movement names are unique case-insensitively, so name lookup is too
    pub fn movement_by_name(&self, name: &str) -> Option<&Movement> {
        let needle = name.to_lowercase();
        self.movements
            .values()
            .find(|m| m.name.to_lowercase() == needle)
    }

    pub fn template_by_name(&self, name: &str) -> Option<&WorkoutTemplate> {
        let needle = name.to_lowercase();
        self.templates
            .values()
            .find(|t| t.name.to_lowercase() == needle)
    }

    /// Movements in name order for listing
    pub fn sorted_movements(&self) -> Vec<&Movement> {
        let mut movements: Vec<&Movement> = self.movements.values().collect();
        movements.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        movements
    }

    pub fn sorted_templates(&self) -> Vec<&WorkoutTemplate> {
        let mut templates: Vec<&WorkoutTemplate> = self.templates.values().collect();
        templates.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        templates
    }

    /// Human-readable title for a session: its template's name, or a
    /// fallback when it was built ad hoc or the template is gone.
    pub fn session_title(&self, session: &WorkoutSession) -> String {
        session
            .template_id
            .and_then(|id| self.template(id))
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "Custom Workout".into())
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen_names: HashMap<String, &str> = HashMap::new();
        for (id, movement) in &self.movements {
            if id != &movement.id {
                errors.push(format!(
                    "Movement key '{}' doesn't match movement.id '{}'",
                    id, movement.id
                ));
            }
            if movement.name.trim().is_empty() {
                errors.push(format!("Movement '{}' has empty name", id));
            }
            if movement.default_set_count < 1 {
                errors.push(format!(
                    "Movement '{}' has default set count {} < 1",
                    movement.name, movement.default_set_count
                ));
            }
            if let Some(other) = seen_names.insert(movement.name.to_lowercase(), &movement.name) {
                errors.push(format!(
                    "Movement name '{}' duplicates '{}' (names are unique case-insensitively)",
                    movement.name, other
                ));
            }
            for variant in &movement.variants {
                if variant.movement_id != movement.id {
                    errors.push(format!(
                        "Variant '{}' of movement '{}' back-references a different movement",
                        variant.name, movement.name
                    ));
                }
                if variant.name.trim().is_empty() {
                    errors.push(format!("Movement '{}' has a variant with empty name", movement.name));
                }
            }
        }

        for (id, template) in &self.templates {
            if id != &template.id {
                errors.push(format!(
                    "Template key '{}' doesn't match template.id '{}'",
                    id, template.id
                ));
            }
            if template.name.trim().is_empty() {
                errors.push(format!("Template '{}' has empty name", id));
            }
            for item in &template.items {
                let Some(movement) = self.movements.get(&item.movement_id) else {
                    errors.push(format!(
                        "Template '{}' references non-existent movement '{}'",
                        template.name, item.movement_id
                    ));
                    continue;
                };
                if let Some(variant_id) = item.default_variant_id {
                    if movement.variant(variant_id).is_none() {
                        errors.push(format!(
                            "Template '{}' prefers variant '{}' which '{}' doesn't have",
                            template.name, variant_id, movement.name
                        ));
                    }
                }
                if item.quantity < 1 {
                    errors.push(format!(
                        "Template '{}': item for '{}' has quantity {} < 1",
                        template.name, movement.name, item.quantity
                    ));
                }
                if let Some(target) = item.target_sets {
                    if target < 1 {
                        errors.push(format!(
                            "Template '{}': item for '{}' has target sets {} < 1",
                            template.name, movement.name, target
                        ));
                    }
                }
            }
        }

        errors
    }
}

/// Builds the starter catalog a fresh install is seeded with
pub fn seed_catalog() -> Catalog {
    let mut catalog = Catalog::default();

    let bench = add_movement(
        &mut catalog,
        "Bench Press",
        "Chest",
        3,
        &[
            ("Barbell", ResistanceType::TotalWeight),
            ("Dumbbell", ResistanceType::PerDumbbell),
            ("Machine", ResistanceType::TotalWeight),
        ],
    );

    let shoulder_press = add_movement(
        &mut catalog,
        "Shoulder Press",
        "Shoulders",
        3,
        &[
            ("Dumbbell", ResistanceType::PerDumbbell),
            ("Barbell", ResistanceType::TotalWeight),
            ("Machine", ResistanceType::TotalWeight),
        ],
    );

    let lateral_raise = add_movement(
        &mut catalog,
        "Lateral Raise",
        "Shoulders",
        3,
        &[
            ("Dumbbell", ResistanceType::PerDumbbell),
            ("Cable", ResistanceType::CableStack),
            ("Machine", ResistanceType::TotalWeight),
        ],
    );

    let triceps = add_movement(
        &mut catalog,
        "Triceps Pushdown",
        "Arms",
        3,
        &[
            ("Cable", ResistanceType::CableStack),
            ("Machine", ResistanceType::TotalWeight),
        ],
    );

    let squat = add_movement(
        &mut catalog,
        "Squat",
        "Legs",
        4,
        &[
            ("Barbell", ResistanceType::TotalWeight),
            ("Machine", ResistanceType::TotalWeight),
        ],
    );

    let lat_pulldown = add_movement(
        &mut catalog,
        "Lat Pulldown",
        "Back",
        3,
        &[
            ("Cable", ResistanceType::CableStack),
            ("Machine", ResistanceType::TotalWeight),
        ],
    );

    add_template(
        &mut catalog,
        "PUSH",
        &[
            (bench, 1, Some(3)),
            (shoulder_press, 1, Some(3)),
            (lateral_raise, 1, Some(3)),
            (triceps, 1, Some(3)),
        ],
    );
    add_template(&mut catalog, "PULL", &[(lat_pulldown, 1, Some(3)), (bench, 1, Some(3))]);
    add_template(&mut catalog, "LEGS", &[(squat, 1, Some(4))]);

    catalog
}

fn add_movement(
    catalog: &mut Catalog,
    name: &str,
    category: &str,
    default_set_count: i32,
    variants: &[(&str, ResistanceType)],
) -> Uuid {
    let id = Uuid::new_v4();
    let movement = Movement {
        id,
        name: name.into(),
        category: category.into(),
        notes: None,
        default_set_count,
        variants: variants
            .iter()
            .map(|(variant_name, resistance_type)| MovementVariant {
                id: Uuid::new_v4(),
                movement_id: id,
                name: (*variant_name).into(),
                resistance_type: *resistance_type,
                notes: None,
            })
            .collect(),
    };
    catalog.movements.insert(id, movement);
    id
}

fn add_template(catalog: &mut Catalog, name: &str, items: &[(Uuid, i32, Option<i32>)]) -> Uuid {
    let id = Uuid::new_v4();
    let template = WorkoutTemplate {
        id,
        name: name.into(),
        created_at: Utc::now(),
        items: items
            .iter()
            .enumerate()
            .map(|(index, (movement_id, quantity, target_sets))| TemplateItem {
                id: Uuid::new_v4(),
                movement_id: *movement_id,
                default_variant_id: None,
                quantity: *quantity,
                target_sets: *target_sets,
                ordering_index: index as i32,
            })
            .collect(),
        notes: None,
    };
    catalog.templates.insert(id, template);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_catalog_contents() {
        let catalog = seed_catalog();
        assert_eq!(catalog.movements.len(), 6);
        assert_eq!(catalog.templates.len(), 3);

        let bench = catalog.movement_by_name("bench press").unwrap();
        assert_eq!(bench.variants.len(), 3);
        assert_eq!(bench.default_set_count, 3);

        let legs = catalog.template_by_name("legs").unwrap();
        assert_eq!(legs.items.len(), 1);
        assert_eq!(legs.items[0].target_sets, Some(4));
    }

    #[test]
    fn test_seed_catalog_validates() {
        let catalog = seed_catalog();
        let errors = catalog.validate();
        assert!(errors.is_empty(), "seed catalog has validation errors: {:?}", errors);
    }

    #[test]
    fn test_all_template_items_reference_existing_movements() {
        let catalog = seed_catalog();
        for template in catalog.templates.values() {
            for item in &template.items {
                assert!(
                    catalog.movements.contains_key(&item.movement_id),
                    "template {} references missing movement",
                    template.name
                );
            }
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let mut catalog = seed_catalog();
        add_movement(&mut catalog, "BENCH press", "Chest", 3, &[]);

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("duplicates")));
    }

    #[test]
    fn test_validate_rejects_dangling_template_movement() {
        let mut catalog = seed_catalog();
        add_template(&mut catalog, "GHOST", &[(Uuid::new_v4(), 1, None)]);

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("non-existent movement")));
    }

    #[test]
    fn test_variant_lookup_resolves_owner() {
        let catalog = seed_catalog();
        let squat = catalog.movement_by_name("Squat").unwrap();
        let barbell = squat.variants.iter().find(|v| v.name == "Barbell").unwrap();

        let (owner, variant) = catalog.variant(barbell.id).unwrap();
        assert_eq!(owner.id, squat.id);
        assert_eq!(variant.name, "Barbell");
    }
}
