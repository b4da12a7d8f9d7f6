use std::path::PathBuf;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::{info, warn};

use crate::catalog::{Catalog, SUGGESTED_MAX_SELECTION};
use crate::error::{TerrainError, TerrainResult};
use crate::export::{channel_to_u8, export_terrain};
use crate::table::{format_table, selection_table};
use crate::terrain::{generate, TerrainImage, TerrainParams};

pub const WINDOW_TITLE: &str = "Flow-based Affective Terrain Map";

/// Largest window side, in pixels.
pub const MAX_WINDOW_SIDE: usize = 4096;

/// Keys toggling catalog entries 1..=18, in catalog order.
const TOGGLE_KEYS: [Key; 18] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F,
    Key::G, Key::H, Key::I, Key::J, Key::K, Key::L,
    Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
];

/// Settings for the interactive viewer
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub params: TerrainParams,
    /// Where `S` saves the current map
    pub output: PathBuf,
    /// Window pixels per grid cell
    pub scale: usize,
    /// PNG upscale factor used when saving
    pub export_scale: u32,
}

/// Which catalog entries are switched on. Selections are always reported in
/// catalog order, the way a multi-select list reports them.
#[derive(Clone, Debug, PartialEq)]
pub struct ToggleSelection {
    flags: Vec<bool>,
}

impl ToggleSelection {
    pub fn from_names<S: AsRef<str>>(catalog: &Catalog, names: &[S]) -> TerrainResult<Self> {
        let mut flags = vec![false; catalog.len()];
        for name in catalog.in_catalog_order(names)? {
            if let Some(idx) = catalog.position(name) {
                flags[idx] = true;
            }
        }
        Ok(Self { flags })
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(flag) = self.flags.get_mut(index) {
            *flag = !*flag;
        }
    }

    pub fn names(&self, catalog: &Catalog) -> Vec<&'static str> {
        catalog
            .entries()
            .iter()
            .zip(&self.flags)
            .filter_map(|(d, &on)| on.then_some(d.name))
            .collect()
    }
}

/// Catalog index bound to a key, if any.
pub fn toggle_index(key: Key) -> Option<usize> {
    TOGGLE_KEYS.iter().position(|&k| k == key)
}

/// What the current frame asked for besides toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameActions {
    pub regenerated: bool,
    pub save: bool,
    pub print_table: bool,
}

/// Selection and the terrain currently on screen.
#[derive(Clone, Debug)]
pub struct ViewerState {
    pub selection: ToggleSelection,
    pub names: Vec<&'static str>,
    pub terrain: TerrainImage,
}

impl ViewerState {
    pub fn new<S: AsRef<str>>(
        catalog: &Catalog,
        initial: &[S],
        params: &TerrainParams,
    ) -> TerrainResult<Self> {
        let selection = ToggleSelection::from_names(catalog, initial)?;
        let names = selection.names(catalog);
        let terrain = generate(&names, catalog, params)?;
        Ok(Self { selection, names, terrain })
    }

    /// Apply one frame of key presses. Toggles are applied and the terrain
    /// regenerated before save and table requests are reported, whatever
    /// order the keys arrived in.
    pub fn handle_keys(
        &mut self,
        keys: &[Key],
        catalog: &Catalog,
        params: &TerrainParams,
    ) -> TerrainResult<FrameActions> {
        let mut actions = FrameActions {
            save: keys.contains(&Key::S),
            print_table: keys.contains(&Key::T),
            ..FrameActions::default()
        };

        let mut toggled = false;
        for idx in keys.iter().filter_map(|&key| toggle_index(key)) {
            self.selection.toggle(idx);
            toggled = true;
        }

        if toggled {
            self.names = self.selection.names(catalog);
            if self.names.len() > SUGGESTED_MAX_SELECTION {
                warn!(selected = self.names.len(), "more than {} descriptors selected", SUGGESTED_MAX_SELECTION);
            }
            info!(selection = ?self.names, "regenerating");
            self.terrain = generate(&self.names, catalog, params)?;
            actions.regenerated = true;
        }

        Ok(actions)
    }
}

/// Window size for a terrain drawn at `scale`, rejecting sizes past
/// `MAX_WINDOW_SIDE`.
pub fn window_size(terrain: &TerrainImage, scale: usize) -> TerrainResult<(usize, usize)> {
    let scale = scale.max(1);
    let side = |cells: usize| {
        cells
            .checked_mul(scale)
            .filter(|&px| px <= MAX_WINDOW_SIDE)
    };
    match (side(terrain.width()), side(terrain.height())) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(TerrainError::invalid_params(format!(
            "{}x{} map at scale {} exceeds the {} pixel window limit",
            terrain.width(),
            terrain.height(),
            scale,
            MAX_WINDOW_SIDE
        ))),
    }
}

/// Pack the terrain into a 0RGB framebuffer, `scale` window pixels per cell,
/// top row first.
pub fn to_framebuffer(terrain: &TerrainImage, scale: usize) -> TerrainResult<Vec<u32>> {
    let (window_width, window_height) = window_size(terrain, scale)?;
    let scale = scale.max(1);
    let height = terrain.height();
    let mut buffer = vec![0u32; window_width * window_height];

    for (x, y, px) in terrain.pixels().iter() {
        let [r, g, b] = px.map(|v| channel_to_u8(v) as u32);
        let color = (r << 16) | (g << 8) | b;
        let top = (height - 1 - y) * scale;
        for dy in 0..scale {
            let row = (top + dy) * window_width;
            for dx in 0..scale {
                buffer[row + x * scale + dx] = color;
            }
        }
    }

    Ok(buffer)
}

fn window_title(names: &[&str]) -> String {
    if names.is_empty() {
        format!("{} - (nothing selected)", WINDOW_TITLE)
    } else {
        format!("{} - {}", WINDOW_TITLE, names.join(", "))
    }
}

fn print_controls(catalog: &Catalog) {
    println!("Viewer started. Controls:");
    for (key, label) in TOGGLE_KEYS.iter().zip(catalog.labels()) {
        println!("  {:?}: toggle {}", key, label);
    }
    println!("  S: Save PNG");
    println!("  T: Print selection table");
    println!("  Esc: Exit");
}

/// Run the interactive terrain viewer.
/// Letters toggle descriptors, S saves, T prints the table, Escape exits.
pub fn run_viewer<S: AsRef<str>>(
    catalog: &Catalog,
    initial: &[S],
    config: &ViewerConfig,
) -> TerrainResult<()> {
    let mut state = ViewerState::new(catalog, initial, &config.params)?;
    let (window_width, window_height) = window_size(&state.terrain, config.scale)?;
    let mut buffer = to_framebuffer(&state.terrain, config.scale)?;

    let mut window = Window::new(
        &window_title(&state.names),
        window_width,
        window_height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| TerrainError::viewer(e.to_string()))?;
    window.set_target_fps(30);

    print_controls(catalog);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let keys = window.get_keys_pressed(KeyRepeat::No);
        let actions = state.handle_keys(&keys, catalog, &config.params)?;

        if actions.regenerated {
            buffer = to_framebuffer(&state.terrain, config.scale)?;
            window.set_title(&window_title(&state.names));
        }
        if actions.save {
            export_terrain(&state.terrain, &config.output, config.export_scale)?;
            println!("Saved terrain map to {}", config.output.display());
        }
        if actions.print_table {
            print!("{}", format_table(&selection_table(&state.names, catalog)?));
        }

        window
            .update_with_buffer(&buffer, window_width, window_height)
            .map_err(|e| TerrainError::viewer(e.to_string()))?;
    }

    Ok(())
}
