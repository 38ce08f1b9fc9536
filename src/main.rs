use hearth::CatalogEntry;

/// Furniture types shipped with the planner, resolved against
/// `assets/models/<key>.obj`.
const FURNITURE_KEYS: [&str; 16] = [
    "bed",
    "bed1",
    "sofa",
    "sofa1",
    "bench1",
    "dining1",
    "dining2",
    "dining3",
    "table1",
    "table2",
    "wardrobe1",
    "furniture1",
    "furniture2",
    "furniture3",
    "furniture4",
    "furniture5",
];

fn main() {
    env_logger::init();

    let entries: Vec<CatalogEntry> = FURNITURE_KEYS
        .into_iter()
        .map(|key| CatalogEntry::new(key, format!("assets/models/{key}.obj")))
        .collect();

    hearth::with_catalog(entries).run();
}
