//! Integration tests for map validation on full-size maps.

use tilewar_map::{
    Coord, GameMode, Grid, ItemKind, MapDocument, MapSize, Tile, TileKind,
    is_door_placement_valid, is_fully_connected, is_fully_connected_from,
    validate,
};

// =========================================================================
// Helpers
// =========================================================================

fn set(grid: &mut Grid, row: usize, col: usize, tile: Tile) {
    *grid.tile_mut(Coord::new(row, col)).unwrap() = tile;
}

/// A legal small map: grass, a wall column with a door, two spawns, a flag.
fn small_map() -> Grid {
    let mut grid = Grid::filled(10, 10, Tile::new(TileKind::Grass));
    for row in 0..10 {
        set(&mut grid, row, 5, Tile::new(TileKind::Wall));
    }
    set(&mut grid, 4, 5, Tile::new(TileKind::ClosedDoor));
    set(&mut grid, 0, 0, Tile::with_item(TileKind::Grass, ItemKind::Spawn));
    set(&mut grid, 9, 9, Tile::with_item(TileKind::Grass, ItemKind::Spawn));
    set(&mut grid, 2, 7, Tile::with_item(TileKind::Ice, ItemKind::Flag));
    set(&mut grid, 7, 2, Tile::with_item(TileKind::Water, ItemKind::Random));
    grid
}

// =========================================================================
// validate()
// =========================================================================

#[test]
fn test_validate_legal_small_map_passes() {
    let report = validate(&small_map(), MapSize::Small, GameMode::CaptureTheFlag, "two halves");
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[test]
fn test_validate_sealed_wall_reports_connectivity() {
    let mut grid = small_map();
    set(&mut grid, 4, 5, Tile::new(TileKind::Wall));
    let report = validate(&grid, MapSize::Small, GameMode::Classic, "sealed");
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("unreachable"));
}

#[test]
fn test_validate_wrong_size_class_reports_dimension_and_spawns() {
    let report = validate(&small_map(), MapSize::Medium, GameMode::Classic, "x");
    assert_eq!(report.errors.len(), 2);
}

#[test]
fn test_validate_missing_flag_only_matters_in_ctf() {
    let mut grid = small_map();
    set(&mut grid, 2, 7, Tile::new(TileKind::Ice));
    assert!(validate(&grid, MapSize::Small, GameMode::Classic, "x").valid);
    let report = validate(&grid, MapSize::Small, GameMode::CaptureTheFlag, "x");
    assert_eq!(report.errors, vec!["capture-the-flag maps need a flag".to_string()]);
}

#[test]
fn test_document_round_trips_through_json_and_validates() {
    let doc = MapDocument {
        name: "halves".into(),
        description: "two halves".into(),
        size: MapSize::Small,
        mode: GameMode::CaptureTheFlag,
        tiles: small_map(),
        is_visible: false,
    };
    let json = serde_json::to_string(&doc).unwrap();
    let back: MapDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
    assert!(back.validate().valid);
}

// =========================================================================
// Connectivity: independence from the BFS start
// =========================================================================

#[test]
fn test_connectivity_answer_is_the_same_from_every_open_cell() {
    let connected = small_map();
    let mut split = small_map();
    set(&mut split, 4, 5, Tile::new(TileKind::Wall));

    for grid in [&connected, &split] {
        let expected = is_fully_connected(grid);
        for (at, tile) in grid.iter() {
            if tile.kind.is_wall() {
                continue;
            }
            assert_eq!(
                is_fully_connected_from(grid, at),
                expected,
                "start {at} disagrees"
            );
        }
    }
}

// =========================================================================
// Door symmetry
// =========================================================================

#[test]
fn test_door_rule_is_symmetric_under_rotation() {
    let mut vertical_walls = Grid::filled(3, 3, Tile::new(TileKind::Grass));
    set(&mut vertical_walls, 0, 1, Tile::new(TileKind::Wall));
    set(&mut vertical_walls, 2, 1, Tile::new(TileKind::Wall));
    set(&mut vertical_walls, 1, 1, Tile::new(TileKind::ClosedDoor));
    assert!(is_door_placement_valid(&vertical_walls));

    let mut horizontal_walls = Grid::filled(3, 3, Tile::new(TileKind::Grass));
    set(&mut horizontal_walls, 1, 0, Tile::new(TileKind::Wall));
    set(&mut horizontal_walls, 1, 2, Tile::new(TileKind::Wall));
    set(&mut horizontal_walls, 1, 1, Tile::new(TileKind::ClosedDoor));
    assert!(is_door_placement_valid(&horizontal_walls));
}

#[test]
fn test_door_on_first_row_is_always_invalid() {
    for col in 0..5 {
        let mut grid = Grid::filled(5, 5, Tile::new(TileKind::Grass));
        set(&mut grid, 0, col, Tile::new(TileKind::OpenDoor));
        assert!(!is_door_placement_valid(&grid), "door at column {col}");
    }
}
