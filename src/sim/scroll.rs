//! Tile maps and the scrolling tile buffer
//!
//! Map documents are static `{width, height, tiles}` JSON grids. The buffer
//! presents a fixed window of `BUFFER_ROWS` rows that scrolls downward through
//! the configured cycle of maps, bottom row of each map first, looping forever.
//!
//! Buffer row `0` is the newest row (top of the screen). Its top edge sits at
//! `-TILE_SIZE + offset`, so it slides fully into view as the sub-tile offset
//! approaches one tile, at which point every row shifts down by one index.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::MapError;

/// Tile types recognised by the game
///
/// Serialized as the plain tile-type string used by map files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TileKind {
    Hub,
    Turret,
    Research,
    Fuel,
    Sensor,
    Cargo,
    /// Continental landmass; drawn but never destroyed
    Continent,
    Other(String),
}

impl TileKind {
    /// Name of the reserved decorative tile
    pub const DECORATIVE: &'static str = "continent_piece";

    pub fn as_str(&self) -> &str {
        match self {
            TileKind::Hub => "hub",
            TileKind::Turret => "turret",
            TileKind::Research => "research",
            TileKind::Fuel => "fuel",
            TileKind::Sensor => "sensor",
            TileKind::Cargo => "cargo",
            TileKind::Continent => Self::DECORATIVE,
            TileKind::Other(name) => name,
        }
    }

    /// Score for shooting this tile
    pub fn points(&self) -> u64 {
        match self {
            TileKind::Hub => 25,
            TileKind::Turret => 20,
            TileKind::Research | TileKind::Fuel | TileKind::Sensor => 15,
            TileKind::Cargo => 12,
            TileKind::Continent => 0,
            TileKind::Other(_) => 10,
        }
    }

    pub fn is_destructible(&self) -> bool {
        !matches!(self, TileKind::Continent)
    }
}

impl From<String> for TileKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "hub" => TileKind::Hub,
            "turret" => TileKind::Turret,
            "research" => TileKind::Research,
            "fuel" => TileKind::Fuel,
            "sensor" => TileKind::Sensor,
            "cargo" => TileKind::Cargo,
            Self::DECORATIVE => TileKind::Continent,
            _ => TileKind::Other(name),
        }
    }
}

impl From<TileKind> for String {
    fn from(kind: TileKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One row of a map (`None` = empty cell)
pub type TileRow = Vec<Option<TileKind>>;

/// A static map document, as produced by the tile editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<TileRow>,
}

impl MapDocument {
    /// A map with every cell empty
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![vec![None; width]; height],
        }
    }

    /// Parse and validate a map document
    pub fn from_json(name: &str, json: &str) -> Result<Self, MapError> {
        let doc: MapDocument = serde_json::from_str(json)?;
        doc.validate(name)?;
        Ok(doc)
    }

    /// Check that the grid matches the declared dimensions
    pub fn validate(&self, name: &str) -> Result<(), MapError> {
        let invalid = |reason: String| MapError::Invalid {
            name: name.to_string(),
            reason,
        };
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "dimensions must be non-zero ({}x{})",
                self.width, self.height
            )));
        }
        if self.tiles.len() != self.height {
            return Err(invalid(format!(
                "expected {} rows, found {}",
                self.height,
                self.tiles.len()
            )));
        }
        if let Some((i, row)) = self
            .tiles
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.width)
        {
            return Err(invalid(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                self.width
            )));
        }
        Ok(())
    }

    /// Row by index, `None` when out of range
    pub fn row(&self, row: isize) -> Option<&TileRow> {
        usize::try_from(row).ok().and_then(|r| self.tiles.get(r))
    }
}

/// The ordered, looping cycle of maps the buffer traverses
#[derive(Debug, Clone)]
pub struct MapLibrary {
    names: Vec<String>,
    cycle: Vec<Rc<MapDocument>>,
}

impl MapLibrary {
    /// Name of the substitute map used when loading fails
    pub const FALLBACK_NAME: &'static str = "default";

    /// Build a cycle from loaded maps. Every name in `order` must be present.
    pub fn new(order: Vec<String>, maps: HashMap<String, MapDocument>) -> Result<Self, MapError> {
        if order.is_empty() {
            return Err(MapError::EmptyCycle);
        }
        let shared: HashMap<String, Rc<MapDocument>> =
            maps.into_iter().map(|(k, v)| (k, Rc::new(v))).collect();
        let cycle = order
            .iter()
            .map(|name| {
                shared
                    .get(name)
                    .cloned()
                    .ok_or_else(|| MapError::UnknownMap(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names: order, cycle })
    }

    /// Single empty map, so gameplay can proceed without terrain
    pub fn fallback() -> Self {
        Self {
            names: vec![Self::FALLBACK_NAME.to_string()],
            cycle: vec![Rc::new(MapDocument::empty(
                FALLBACK_MAP_WIDTH,
                FALLBACK_MAP_HEIGHT,
            ))],
        }
    }

    /// Load every map named in `order` through `loader`.
    ///
    /// All-or-nothing: any failure is logged and the fallback library is
    /// returned instead.
    pub fn load_with<F>(order: &[String], mut loader: F) -> Self
    where
        F: FnMut(&str) -> Result<MapDocument, MapError>,
    {
        let mut maps = HashMap::new();
        for name in order {
            if maps.contains_key(name) {
                continue;
            }
            match loader(name) {
                Ok(doc) => {
                    log::info!("Loaded map: {} ({}x{})", name, doc.width, doc.height);
                    maps.insert(name.clone(), doc);
                }
                Err(e) => {
                    log::error!("Failed to load maps: {}", e);
                    log::warn!("Using fallback default map");
                    return Self::fallback();
                }
            }
        }
        Self::new(order.to_vec(), maps).unwrap_or_else(|e| {
            log::error!("Invalid map cycle: {}", e);
            Self::fallback()
        })
    }

    /// Number of entries in the cycle (duplicates count)
    pub fn len(&self) -> usize {
        self.cycle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycle.is_empty()
    }

    pub fn name_at(&self, index: usize) -> &str {
        &self.names[index % self.names.len()]
    }

    pub fn map_at(&self, index: usize) -> Rc<MapDocument> {
        Rc::clone(&self.cycle[index % self.cycle.len()])
    }
}

/// Sliding tile window over the map cycle
#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    library: Rc<MapLibrary>,
    cycle_index: usize,
    current: Rc<MapDocument>,
    /// Next map row to pull in (counts down; negative = map exhausted)
    cursor: isize,
    next: Option<Rc<MapDocument>>,
    rows: VecDeque<Option<TileRow>>,
    pixel_offset: f32,
    rows_shifted: u64,
}

impl ScrollBuffer {
    pub fn new(library: Rc<MapLibrary>) -> Self {
        let current = library.map_at(0);
        let mut buffer = Self {
            library,
            cycle_index: 0,
            current,
            cursor: 0,
            next: None,
            rows: VecDeque::with_capacity(BUFFER_ROWS),
            pixel_offset: 0.0,
            rows_shifted: 0,
        };
        buffer.reset();
        buffer
    }

    /// Rewind to the bottom of the first map in the cycle
    pub fn reset(&mut self) {
        self.cycle_index = 0;
        self.current = self.library.map_at(0);
        self.next = None;
        self.pixel_offset = 0.0;
        self.rows_shifted = 0;

        let height = self.current.height as isize;
        let window = BUFFER_ROWS as isize;
        self.rows.clear();
        for i in 0..window {
            self.rows
                .push_back(self.current.row(height - window + i).cloned());
        }
        self.cursor = height - window - 1;
    }

    /// Scroll by `speed` pixels, shifting one row per full tile crossed
    pub fn advance(&mut self, speed: f32) {
        if !speed.is_finite() || speed <= 0.0 {
            return;
        }
        if self.next.is_none() && self.cursor < MAP_LOOKAHEAD_ROWS {
            self.stage_next();
        }
        self.pixel_offset += speed;
        while self.pixel_offset >= TILE_SIZE {
            self.pixel_offset -= TILE_SIZE;
            self.shift_row();
        }
    }

    fn stage_next(&mut self) {
        let index = (self.cycle_index + 1) % self.library.len();
        log::debug!(
            "Preparing transition to map: {}",
            self.library.name_at(index)
        );
        self.next = Some(self.library.map_at(index));
    }

    fn shift_row(&mut self) {
        if self.cursor < 0 {
            if self.next.is_none() {
                self.stage_next();
            }
            if let Some(next) = self.next.take() {
                self.cycle_index = (self.cycle_index + 1) % self.library.len();
                self.cursor = next.height as isize - 1;
                self.current = next;
                log::info!(
                    "Switched to map: {} (index: {})",
                    self.library.name_at(self.cycle_index),
                    self.cycle_index
                );
            }
        }

        let row = self.current.row(self.cursor).cloned();
        if self.cursor >= 0 {
            self.cursor -= 1;
        }
        self.rows.pop_back();
        self.rows.push_front(row);
        self.rows_shifted += 1;
    }

    /// Buffer cell under a pixel position
    fn cell_index(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let col = (x / TILE_SIZE).floor();
        let row = ((y - self.pixel_offset) / TILE_SIZE).floor() + 1.0;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        Some((col as usize, row as usize))
    }

    /// Tile under a pixel position, `None` when empty or out of bounds
    pub fn tile_at(&self, x: f32, y: f32) -> Option<&TileKind> {
        let (col, row) = self.cell_index(x, y)?;
        self.rows.get(row)?.as_ref()?.get(col)?.as_ref()
    }

    /// Remove the tile under a pixel position from the buffer
    pub fn clear_tile_at(&mut self, x: f32, y: f32) -> Option<TileKind> {
        let (col, row) = self.cell_index(x, y)?;
        self.rows.get_mut(row)?.as_mut()?.get_mut(col)?.take()
    }

    /// Sub-tile offset for smooth drawing
    pub fn current_scroll_offset_pixels(&self) -> f32 {
        self.pixel_offset
    }

    /// Screen y of the top edge of buffer row `row`
    pub fn row_top(&self, row: usize) -> f32 {
        (row as f32 - 1.0) * TILE_SIZE + self.pixel_offset
    }

    /// Screen position of the centre of a buffer cell
    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * TILE_SIZE,
            self.row_top(row) + TILE_SIZE / 2.0,
        )
    }

    /// Buffer rows, top of screen first
    pub fn rows(&self) -> impl Iterator<Item = Option<&TileRow>> {
        self.rows.iter().map(Option::as_ref)
    }

    pub fn current_map_name(&self) -> &str {
        self.library.name_at(self.cycle_index)
    }

    pub fn cycle_index(&self) -> usize {
        self.cycle_index
    }

    pub fn map_cursor(&self) -> isize {
        self.cursor
    }

    /// Total rows shifted since the last reset
    pub fn rows_shifted(&self) -> u64 {
        self.rows_shifted
    }

    pub fn library(&self) -> &Rc<MapLibrary> {
        &self.library
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Map whose every cell is tagged with its map and row
    fn tagged_map(tag: &str, width: usize, height: usize) -> MapDocument {
        MapDocument {
            width,
            height,
            tiles: (0..height)
                .map(|r| {
                    (0..width)
                        .map(|c| Some(TileKind::Other(format!("{tag}:{r}:{c}"))))
                        .collect()
                })
                .collect(),
        }
    }

    fn library(specs: &[(&str, usize)], order: &[&str]) -> Rc<MapLibrary> {
        let maps = specs
            .iter()
            .map(|(name, h)| (name.to_string(), tagged_map(name, 4, *h)))
            .collect();
        let order = order.iter().map(|s| s.to_string()).collect();
        Rc::new(MapLibrary::new(order, maps).expect("valid library"))
    }

    fn snapshot(buffer: &ScrollBuffer) -> Vec<Option<TileRow>> {
        buffer.rows().map(|r| r.cloned()).collect()
    }

    #[test]
    fn test_tile_kind_points() {
        assert_eq!(TileKind::from("hub".to_string()).points(), 25);
        assert_eq!(TileKind::from("turret".to_string()).points(), 20);
        assert_eq!(TileKind::from("sensor".to_string()).points(), 15);
        assert_eq!(TileKind::from("cargo".to_string()).points(), 12);
        assert_eq!(TileKind::from("dock".to_string()).points(), 10);
        let continent = TileKind::from(TileKind::DECORATIVE.to_string());
        assert_eq!(continent.points(), 0);
        assert!(!continent.is_destructible());
    }

    #[test]
    fn test_map_json_parsing() {
        let json = r#"{"width":2,"height":2,"tiles":[["hub",null],[null,"continent_piece"]]}"#;
        let doc = MapDocument::from_json("tiny", json).expect("valid map");
        assert_eq!(doc.tiles[0][0], Some(TileKind::Hub));
        assert_eq!(doc.tiles[1][1], Some(TileKind::Continent));
        assert_eq!(doc.tiles[0][1], None);
    }

    #[test]
    fn test_map_json_rejects_bad_shape() {
        let json = r#"{"width":2,"height":2,"tiles":[["hub",null]]}"#;
        assert!(matches!(
            MapDocument::from_json("short", json),
            Err(MapError::Invalid { .. })
        ));
        assert!(matches!(
            MapDocument::from_json("garbage", "not json"),
            Err(MapError::Json(_))
        ));
        let json = r#"{"width":0,"height":0,"tiles":[]}"#;
        assert!(MapDocument::from_json("zero", json).is_err());
    }

    #[test]
    fn test_library_unknown_map() {
        let result = MapLibrary::new(vec!["missing".into()], HashMap::new());
        assert!(matches!(result, Err(MapError::UnknownMap(_))));
        assert!(matches!(
            MapLibrary::new(Vec::new(), HashMap::new()),
            Err(MapError::EmptyCycle)
        ));
    }

    #[test]
    fn test_load_failure_falls_back_to_empty_map() {
        let order = vec!["a".to_string(), "b".to_string()];
        let lib = MapLibrary::load_with(&order, |name| {
            if name == "a" {
                Ok(tagged_map("a", 4, 40))
            } else {
                Err(MapError::Fetch {
                    name: name.to_string(),
                    reason: "404".into(),
                })
            }
        });
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.name_at(0), MapLibrary::FALLBACK_NAME);

        let mut buffer = ScrollBuffer::new(Rc::new(lib));
        for _ in 0..500 {
            buffer.advance(MAP_SCROLL_SPEED * 7.0);
        }
        assert!(buffer.rows().all(|row| row.is_none_or(|r| r.iter().all(Option::is_none))));
        assert_eq!(buffer.tile_at(100.0, 300.0), None);
    }

    #[test]
    fn test_load_dedupes_repeated_names() {
        let order: Vec<String> = ["a", "b", "a"].iter().map(|s| s.to_string()).collect();
        let mut calls = Vec::new();
        let lib = MapLibrary::load_with(&order, |name| {
            calls.push(name.to_string());
            Ok(tagged_map(name, 2, 34))
        });
        assert_eq!(calls, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(lib.len(), 3);
        assert!(Rc::ptr_eq(&lib.map_at(0), &lib.map_at(2)));
    }

    #[test]
    fn test_initial_window_shows_bottom_of_first_map() {
        let buffer = ScrollBuffer::new(library(&[("a", 40)], &["a"]));
        let rows = snapshot(&buffer);
        // Top of the window is map row 8, bottom is the last map row
        assert_eq!(rows[0].as_ref().unwrap()[0], Some(TileKind::Other("a:8:0".into())));
        assert_eq!(rows[31].as_ref().unwrap()[0], Some(TileKind::Other("a:39:0".into())));
        assert_eq!(buffer.map_cursor(), 7);
    }

    #[test]
    fn test_tile_lookup_out_of_bounds() {
        let buffer = ScrollBuffer::new(library(&[("a", 40)], &["a"]));
        assert_eq!(buffer.tile_at(-1.0, 100.0), None);
        assert_eq!(buffer.tile_at(10.0, -30.0), None);
        assert_eq!(buffer.tile_at(4.0 * TILE_SIZE + 1.0, 100.0), None);
        assert_eq!(buffer.tile_at(10.0, 10_000.0), None);
        assert_eq!(buffer.tile_at(f32::NAN, 10.0), None);
    }

    #[test]
    fn test_cell_center_round_trips_through_tile_at() {
        let mut buffer = ScrollBuffer::new(library(&[("a", 40)], &["a"]));
        buffer.advance(7.3);
        let center = buffer.cell_center(2, 10);
        assert_eq!(
            buffer.tile_at(center.x, center.y),
            Some(&TileKind::Other("a:18:2".into()))
        );
        assert_eq!(
            buffer.clear_tile_at(center.x, center.y),
            Some(TileKind::Other("a:18:2".into()))
        );
        assert_eq!(buffer.tile_at(center.x, center.y), None);
    }

    #[test]
    fn test_switches_to_next_map_in_cycle() {
        let mut buffer = ScrollBuffer::new(library(&[("a", 34), ("b", 36)], &["a", "b"]));
        assert_eq!(buffer.current_map_name(), "a");
        // Two rows remain in "a" after the initial window
        for _ in 0..2 {
            buffer.advance(TILE_SIZE);
        }
        assert_eq!(buffer.current_map_name(), "a");
        buffer.advance(TILE_SIZE);
        assert_eq!(buffer.current_map_name(), "b");
        assert_eq!(buffer.cycle_index(), 1);
        let top = snapshot(&buffer)[0].clone().unwrap();
        assert_eq!(top[0], Some(TileKind::Other("b:35:0".into())));
    }

    #[test]
    fn test_full_cycle_returns_to_initial_window() {
        let lib = library(&[("a", 40), ("b", 33), ("c", 57)], &["a", "b", "a", "c"]);
        let mut buffer = ScrollBuffer::new(lib);
        let initial = snapshot(&buffer);
        let initial_cursor = buffer.map_cursor();
        let cycle_rows = 40 + 33 + 40 + 57;

        for lap in 1..=2 {
            for _ in 0..cycle_rows {
                buffer.advance(TILE_SIZE);
            }
            assert_eq!(buffer.cycle_index(), 0, "lap {lap}");
            assert_eq!(buffer.map_cursor(), initial_cursor, "lap {lap}");
            assert_eq!(snapshot(&buffer), initial, "lap {lap}");
        }
        assert_eq!(buffer.rows_shifted(), 2 * cycle_rows as u64);
    }

    #[test]
    fn test_reset_rewinds_to_first_map() {
        let mut buffer = ScrollBuffer::new(library(&[("a", 34), ("b", 36)], &["a", "b"]));
        let initial = snapshot(&buffer);
        for _ in 0..200 {
            buffer.advance(5.5);
        }
        buffer.reset();
        assert_eq!(buffer.cycle_index(), 0);
        assert_eq!(buffer.current_scroll_offset_pixels(), 0.0);
        assert_eq!(snapshot(&buffer), initial);
    }

    #[test]
    fn test_non_positive_speed_is_ignored() {
        let mut buffer = ScrollBuffer::new(library(&[("a", 40)], &["a"]));
        buffer.advance(-3.0);
        buffer.advance(f32::NAN);
        buffer.advance(0.0);
        assert_eq!(buffer.current_scroll_offset_pixels(), 0.0);
        assert_eq!(buffer.rows_shifted(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_one_shift_per_tile_crossed(
            speeds in prop::collection::vec(0.01f32..30.0, 1..10_000)
        ) {
            let mut buffer = ScrollBuffer::new(library(&[("a", 40), ("b", 50)], &["a", "b"]));
            let mut total_pixels = 0.0f64;
            for &speed in &speeds {
                let before_offset = buffer.current_scroll_offset_pixels();
                let before_shifts = buffer.rows_shifted();
                buffer.advance(speed);
                let shifted = buffer.rows_shifted() - before_shifts;
                let after = buffer.current_scroll_offset_pixels();

                prop_assert!((0.0..TILE_SIZE).contains(&after));
                let expected = before_offset + speed - shifted as f32 * TILE_SIZE;
                prop_assert!((expected - after).abs() < 1e-3);
                total_pixels += speed as f64;
            }
            let accounted = buffer.rows_shifted() as f64 * TILE_SIZE as f64
                + buffer.current_scroll_offset_pixels() as f64;
            prop_assert!((accounted - total_pixels).abs() < 0.5);
        }
    }
}
