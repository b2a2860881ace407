use std::path::{Path, PathBuf};

use tmxgraph_assets::prelude::DocumentFormat;
use tmxgraph_core::entities::OBJECT_GROUP;
use tmxgraph_core::prelude::*;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load() -> Document {
    Loader::default()
        .load(fixtures().join("orthogonal.tmj"))
        .unwrap()
}

#[test]
fn test_json_map_header() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();

    assert_eq!(map.version(), "1.10");
    assert_eq!(map.orientation(), "orthogonal");
    assert_eq!(map.size(), (3, 2));
    assert_eq!(map.compression_level(), -1);
    assert!(!map.infinite());
}

#[test]
fn test_json_external_tileset() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();
    let tilesets = map.tilesets();

    assert_eq!(tilesets[0].image().and_then(|image| image.source()), Some("images/inline.png"));
    assert_eq!(tilesets[0].image().and_then(|image| image.width()), Some(32));

    let terrain = tilesets[1];
    assert_eq!(terrain.source(), Some("tiles.tsj"));
    assert_eq!(terrain.firstgid(), 5);
    assert_eq!(terrain.tile_offset(), (0, 4));
    assert_eq!(
        terrain.image().and_then(|image| image.path()),
        Some(fixtures().join("images").join("terrain.png"))
    );

    let water = terrain.tile_entry(1).unwrap();
    assert_eq!(water.class(), Some("water"));
    assert_eq!(water.animation().len(), 2);
    assert_eq!(
        water.properties().and_then(|bag| bag.get("liquid")),
        Some(&PropertyValue::Bool(true))
    );
    assert_eq!(
        terrain.tile_entry(3).and_then(|tile| tile.collision()).map(|group| group.objects().len()),
        Some(1)
    );
}

#[test]
fn test_json_layer_polymorphism() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();
    let layers = map.layers();

    assert!(matches!(layers[0].kind(), Some(LayerKind::Tiles(_))));
    assert!(matches!(layers[1].kind(), Some(LayerKind::Objects(_))));
    assert!(matches!(layers[2].kind(), Some(LayerKind::Group(_))));

    let names: Vec<_> = map.all_layers().iter().map(|layer| layer.name()).collect();
    assert_eq!(names, vec!["ground", "spawns", "decor", "sky"]);
}

#[test]
fn test_json_grid_payload_is_sized() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();
    let Some(LayerKind::Tiles(ground)) = map.layers()[0].kind() else {
        panic!("first layer is not a tile layer");
    };

    let grid = ground.grid().unwrap();
    assert_eq!((grid.width(), grid.height()), (Some(3), Some(2)));
    assert_eq!(grid.get(1, 1).unwrap(), 6);
    assert_eq!(grid.get_at(&[0, 1]).unwrap(), 5);
    assert!(matches!(
        grid.get_at(&[0]),
        Err(LoadError::MalformedGridIndex(1))
    ));

    let flipped = ground.tile(2, 1).unwrap();
    assert!(flipped.flip.horizontal);
    assert_eq!(flipped.gid(), 6);
}

#[test]
fn test_json_object_shapes() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();
    let Some(LayerKind::Objects(spawns)) = map.layers()[1].kind() else {
        panic!("second layer is not an object group");
    };
    let objects = spawns.objects();

    assert!(matches!(objects[0].shape(), ObjectShape::Ellipse { .. }));
    let ObjectShape::Polygon(points) = objects[1].shape() else {
        panic!("fence is not a polygon");
    };
    assert_eq!(points.len(), 3);
    assert_eq!(points[2], (16.0, 8.0));

    let text = objects[2].text().unwrap();
    assert_eq!(text.text(), "Hello");
    assert!(text.wrap());
    assert_eq!(text.halign(), "left");

    let chest = objects[3].tile().unwrap().unwrap();
    assert_eq!(chest.id, 1);
    assert!(chest.entry.is_some());
}

#[test]
fn test_json_properties() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();
    let properties = map.properties().unwrap();

    assert_eq!(properties["visible"], PropertyValue::Bool(false));
    assert_eq!(properties["difficulty"], PropertyValue::Int(3));
    assert_eq!(properties["stats"], PropertyValue::Class("Stats".into()));
}

#[test]
fn test_json_images_descend_into_groups() {
    let doc = load();
    let map = MapView::root(&doc).unwrap();
    let sources: Vec<_> = map.images().iter().filter_map(|image| image.source()).collect();
    assert_eq!(
        sources,
        vec!["images/inline.png", "images/terrain.png", "images/sky.png"]
    );
}

#[test]
fn test_xml_and_json_agree_on_tiles() {
    let json = load();
    let xml = Loader::default()
        .load(fixtures().join("orthogonal.tmx"))
        .unwrap();
    let json_map = MapView::root(&json).unwrap();
    let xml_map = MapView::root(&xml).unwrap();

    for gid in [0, 1, 4, 5, 6, 8, 0x8000_0006] {
        let from_json = json_map.tile(gid).unwrap();
        let from_xml = xml_map.tile(gid).unwrap();
        assert_eq!(from_json.id, from_xml.id);
        assert_eq!(from_json.flip, from_xml.flip);
        assert_eq!(from_json.gid(), from_xml.gid());
        assert_eq!(from_json.entry.is_some(), from_xml.entry.is_some());
    }
}

#[test]
fn test_json_object_group_specialized_by_class() {
    let mut registry = TypeRegistry::with_defaults();
    let base = registry.get(OBJECT_GROUP).unwrap().clone();
    registry.register(
        EntityType::specialize(&base, "SpawnGroup", "spawn")
            .field(FieldDescriptor::int("team").default(2)),
    );

    let doc = Loader::default()
        .with_registry(registry)
        .load(fixtures().join("orthogonal.tmj"))
        .unwrap();
    let spawns = MapView::root(&doc).unwrap().layers()[1];
    assert_eq!(spawns.entry().kind(), "SpawnGroup");
    assert_eq!(spawns.entry().get_int("team"), Some(2));
    let Some(LayerKind::Objects(group)) = spawns.kind() else {
        panic!("specialized group is still an object group");
    };
    assert_eq!(group.objects().len(), 4);

    // No subtype registered for "spawn": the base type is built
    let doc = load();
    let spawns = MapView::root(&doc).unwrap().layers()[1];
    assert_eq!(spawns.entry().kind(), OBJECT_GROUP);
    assert!(spawns.entry().get("team").is_none());
}

#[test]
fn test_json_map_with_xml_tileset() {
    let contents = r#"{
  "version": "1.10", "orientation": "orthogonal", "renderorder": "right-down",
  "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
  "tilesets": [{ "firstgid": 9, "source": "tiles.tsx" }],
  "layers": [{ "type": "tilelayer", "name": "a", "width": 1, "height": 1, "data": [10] }]
}"#;

    let doc = Loader::default()
        .load_str(contents, DocumentFormat::Json, fixtures().join("mixed.tmj"))
        .unwrap();
    let map = MapView::root(&doc).unwrap();
    let terrain = map.tilesets()[0];
    assert_eq!(terrain.name(), Some("terrain"));
    assert_eq!(terrain.firstgid(), 9);
    assert_eq!(terrain.source(), Some("tiles.tsx"));
    assert_eq!(
        terrain.image().and_then(|image| image.path()),
        Some(fixtures().join("images").join("terrain.png"))
    );

    let water = map.tile(10).unwrap();
    assert_eq!(water.id, 1);
    let entry = water.entry.and_then(|id| TileView::new(&doc, id)).unwrap();
    assert_eq!(entry.class(), Some("water"));
}
