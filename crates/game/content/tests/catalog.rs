use std::path::Path;

use battle_content::{ContentFactory, embedded_game_data};
use battle_core::{
    Combatant, ElementType, ItemEffect, ItemOracle, MoveOracle, SpeciesOracle, StatusKind,
    TypeChartOracle,
};

#[test]
fn embedded_catalog_is_consistent() {
    let data = embedded_game_data().unwrap();
    assert_eq!(data.species_count(), 9);
    assert!(data.move_count() >= 20);

    for id in data.species_ids() {
        let template = data.species(id).unwrap();
        let combatant = Combatant::from_template(&template, 30);
        assert!(combatant.validate().is_ok(), "{id}");
        assert!(!combatant.moves.is_empty(), "{id} knows no moves at 30");
        for name in &combatant.moves {
            assert!(data.move_definition(name).is_some(), "{id}: {name}");
        }
    }
}

#[test]
fn type_chart_matches_element_rules() {
    let data = embedded_game_data().unwrap();
    assert_eq!(data.effectiveness(ElementType::Water, ElementType::Fire), 2.0);
    assert_eq!(data.effectiveness(ElementType::Fire, ElementType::Water), 0.5);
    assert_eq!(data.effectiveness(ElementType::Electric, ElementType::Earth), 0.0);
    assert_eq!(data.effectiveness(ElementType::Normal, ElementType::Fire), 1.0);
    assert_eq!(
        data.effectiveness_against(ElementType::Ice, &[ElementType::Air, ElementType::Normal]),
        2.0
    );
}

#[test]
fn items_cover_every_effect_kind() {
    let data = embedded_game_data().unwrap();
    assert_eq!(data.item("potion").unwrap().effect, ItemEffect::Heal(20));
    assert_eq!(
        data.item("antidote").unwrap().effect,
        ItemEffect::Cure(Some(StatusKind::Poison))
    );
    assert!(matches!(
        data.item("x_attack").unwrap().effect,
        ItemEffect::StatBoost { stages: 1, .. }
    ));
    assert!(data.item("elixir").is_none());
}

#[test]
fn data_directory_matches_embedded_catalog() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let from_disk = ContentFactory::new(dir).load_game_data().unwrap();
    let embedded = embedded_game_data().unwrap();
    assert_eq!(from_disk.species_count(), embedded.species_count());
    assert_eq!(from_disk.move_count(), embedded.move_count());
    assert_eq!(from_disk.item_count(), embedded.item_count());
}
