//! The dynamic-shape "disc hints" bag (§9 design note): navigation evidence
//! gathered from `index.bdmv`, `MovieObject.bdmv`, and the IG menu stream,
//! consumed by the confidence-refinement and special-feature enrichment
//! passes. Every field is optional; a pass degrades to its fallback behavior
//! when the evidence it needs is absent.

use std::collections::BTreeMap;

use crate::ig::InteractiveComposition;
use crate::model::{IgButtonHint, IndexBdmv, MovieObjectBdmv};

/// A light summary of the parsed IG menu, kept alongside the raw button hints
/// so enrichment passes don't need to re-walk page/BOG/button structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgSummary {
    pub page_count: usize,
    pub button_count: usize,
    /// Distinct register-2 values written across all buttons, sorted ascending.
    /// Register 2 conventionally carries a chapter index on these discs.
    pub register2_writes: Vec<u32>,
}

/// The open hint bag described in the design notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscHints {
    pub index: Option<IndexBdmv>,
    pub movie_objects: Option<MovieObjectBdmv>,
    /// `title_num -> playlist numbers reachable from that title`, resolved by
    /// following `title -> movie_object -> PlayPL operand1`.
    pub title_playlists: BTreeMap<u16, Vec<u32>>,
    pub ig_menu: Option<IgSummary>,
    pub ig_hints_raw: Vec<IgButtonHint>,
}

impl DiscHints {
    /// Build the hint bag from whichever of `index.bdmv` / `MovieObject.bdmv` /
    /// the IG menu were successfully parsed. Any of the three may be `None`.
    pub fn build(
        index: Option<IndexBdmv>,
        movie_objects: Option<MovieObjectBdmv>,
        ig: Option<InteractiveComposition>,
    ) -> DiscHints {
        let mut title_playlists = BTreeMap::new();
        if let (Some(idx), Some(mo)) = (&index, &movie_objects) {
            // `playlist_to_objects` is keyed by object id despite its name:
            // object_id -> playlists that object's PlayPL* commands reach.
            let obj_playlists = mo.playlist_to_objects();
            for title in &idx.titles {
                if let Some(playlists) = obj_playlists.get(&title.movie_object_id) {
                    title_playlists.insert(title.title_num, playlists.clone());
                }
            }
        }

        let ig_hints_raw = ig
            .as_ref()
            .map(crate::ig::extract_menu_hints)
            .unwrap_or_default();

        let ig_menu = ig.as_ref().map(|ics| {
            let mut reg2: Vec<u32> = ig_hints_raw
                .iter()
                .filter_map(|h| h.register(2))
                .collect();
            reg2.sort_unstable();
            reg2.dedup();
            IgSummary {
                page_count: ics.pages.len(),
                button_count: ics.pages.iter().map(|p| p.buttons.len()).sum(),
                register2_writes: reg2,
            }
        });

        DiscHints {
            index,
            movie_objects,
            title_playlists,
            ig_menu,
            ig_hints_raw,
        }
    }

    /// All playlist numbers named anywhere in the title-to-playlist map.
    pub fn hinted_playlist_numbers(&self) -> std::collections::BTreeSet<u32> {
        self.title_playlists.values().flatten().copied().collect()
    }
}
